//! Skeleton updates delivered by motion-capture streaming.

use std::collections::BTreeMap;

use crate::ffi::MocapBone;

macro_rules! bone_indices {
    ($($name:ident = $value:literal),+ $(,)?) => {
        /// `TsBoneIndex`: every bone the vendor skeleton can report.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(i32)]
        #[allow(missing_docs, reason = "variant names are the vendor bone names")]
        pub enum BoneIndex {
            $($name = $value),+
        }

        impl BoneIndex {
            /// Every bone in vendor index order.
            pub const ALL: &'static [BoneIndex] = &[$(BoneIndex::$name),+];

            /// Decode a vendor bone index.
            pub fn from_raw(raw: i32) -> Option<Self> {
                match raw {
                    $($value => Some(BoneIndex::$name),)+
                    _ => None,
                }
            }

            /// Vendor name without the `TsBoneIndex_` prefix.
            pub fn name(self) -> &'static str {
                match self {
                    $(BoneIndex::$name => stringify!($name),)+
                }
            }
        }
    };
}

bone_indices! {
    Hips = 0,
    LeftUpperLeg = 1,
    RightUpperLeg = 2,
    LeftLowerLeg = 3,
    RightLowerLeg = 4,
    LeftFoot = 5,
    RightFoot = 6,
    Spine = 7,
    Chest = 8,
    UpperSpine = 9,
    Neck = 10,
    Head = 11,
    LeftShoulder = 12,
    RightShoulder = 13,
    LeftUpperArm = 14,
    RightUpperArm = 15,
    LeftLowerArm = 16,
    RightLowerArm = 17,
    LeftHand = 18,
    RightHand = 19,
    LeftThumbProximal = 20,
    LeftThumbIntermediate = 21,
    LeftThumbDistal = 22,
    LeftIndexProximal = 23,
    LeftIndexIntermediate = 24,
    LeftIndexDistal = 25,
    LeftMiddleProximal = 26,
    LeftMiddleIntermediate = 27,
    LeftMiddleDistal = 28,
    LeftRingProximal = 29,
    LeftRingIntermediate = 30,
    LeftRingDistal = 31,
    LeftLittleProximal = 32,
    LeftLittleIntermediate = 33,
    LeftLittleDistal = 34,
    RightThumbProximal = 35,
    RightThumbIntermediate = 36,
    RightThumbDistal = 37,
    RightIndexProximal = 38,
    RightIndexIntermediate = 39,
    RightIndexDistal = 40,
    RightMiddleProximal = 41,
    RightMiddleIntermediate = 42,
    RightMiddleDistal = 43,
    RightRingProximal = 44,
    RightRingIntermediate = 45,
    RightRingDistal = 46,
    RightLittleProximal = 47,
    RightLittleIntermediate = 48,
    RightLittleDistal = 49,
}

impl BoneIndex {
    /// Raw vendor value.
    pub fn as_raw(self) -> i32 {
        self as i32
    }
}

/// The bones one skeleton callback reported, in vendor coordinates.
///
/// Bones the library could not resolve for this frame are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkeletonFrame {
    bones: BTreeMap<BoneIndex, MocapBone>,
}

impl SkeletonFrame {
    /// Create an empty frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a bone, replacing any earlier value.
    pub fn insert(&mut self, index: BoneIndex, bone: MocapBone) {
        self.bones.insert(index, bone);
    }

    /// Look up one bone.
    pub fn bone(&self, index: BoneIndex) -> Option<&MocapBone> {
        self.bones.get(&index)
    }

    /// Iterate bones in index order.
    pub fn iter(&self) -> impl Iterator<Item = (BoneIndex, &MocapBone)> {
        self.bones.iter().map(|(index, bone)| (*index, bone))
    }

    /// Number of bones present.
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    /// Whether no bones are present.
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }
}

impl FromIterator<(BoneIndex, MocapBone)> for SkeletonFrame {
    fn from_iter<I: IntoIterator<Item = (BoneIndex, MocapBone)>>(iter: I) -> Self {
        Self {
            bones: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_are_dense() {
        assert_eq!(BoneIndex::ALL.len(), 50);
        for (position, bone) in BoneIndex::ALL.iter().enumerate() {
            assert_eq!(bone.as_raw() as usize, position);
            assert_eq!(BoneIndex::from_raw(bone.as_raw()), Some(*bone));
        }
        assert_eq!(BoneIndex::from_raw(50), None);
    }

    #[test]
    fn test_frame_keeps_latest_value() {
        let mut frame = SkeletonFrame::new();
        frame.insert(BoneIndex::Hips, MocapBone::default());
        let mut moved = MocapBone::default();
        moved.position.x = 2.0;
        frame.insert(BoneIndex::Hips, moved);
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.bone(BoneIndex::Hips).map(|b| b.position.x), Some(2.0));
    }
}
