//! Vendor-to-host coordinate conversion for skeleton bones.
//!
//! The vendor skeleton is Y-up; hosts consume it Z-up with a flipped
//! forward axis, so `(x, y, z)` becomes `(x, z, -y)` for positions and the
//! quaternion vector part is permuted the same way.

use serde::Serialize;
use teslasuit_api::{BoneIndex, MocapBone};

/// Bones kept by [`MocapStream`](crate::MocapStream): sixteen suit bones
/// followed by fifteen per hand.
pub const TRACKED_BONES: [BoneIndex; 46] = [
    BoneIndex::Hips,
    BoneIndex::UpperSpine,
    BoneIndex::Spine,
    BoneIndex::RightShoulder,
    BoneIndex::RightUpperArm,
    BoneIndex::RightLowerArm,
    BoneIndex::RightHand,
    BoneIndex::LeftUpperArm,
    BoneIndex::LeftLowerArm,
    BoneIndex::LeftHand,
    BoneIndex::RightUpperLeg,
    BoneIndex::RightLowerLeg,
    BoneIndex::RightFoot,
    BoneIndex::LeftUpperLeg,
    BoneIndex::LeftLowerLeg,
    BoneIndex::LeftFoot,
    BoneIndex::RightThumbProximal,
    BoneIndex::RightThumbIntermediate,
    BoneIndex::RightThumbDistal,
    BoneIndex::RightIndexProximal,
    BoneIndex::RightIndexIntermediate,
    BoneIndex::RightIndexDistal,
    BoneIndex::RightMiddleProximal,
    BoneIndex::RightMiddleIntermediate,
    BoneIndex::RightMiddleDistal,
    BoneIndex::RightRingProximal,
    BoneIndex::RightRingIntermediate,
    BoneIndex::RightRingDistal,
    BoneIndex::RightLittleProximal,
    BoneIndex::RightLittleIntermediate,
    BoneIndex::RightLittleDistal,
    BoneIndex::LeftThumbProximal,
    BoneIndex::LeftThumbIntermediate,
    BoneIndex::LeftThumbDistal,
    BoneIndex::LeftIndexProximal,
    BoneIndex::LeftIndexIntermediate,
    BoneIndex::LeftIndexDistal,
    BoneIndex::LeftMiddleProximal,
    BoneIndex::LeftMiddleIntermediate,
    BoneIndex::LeftMiddleDistal,
    BoneIndex::LeftRingProximal,
    BoneIndex::LeftRingIntermediate,
    BoneIndex::LeftRingDistal,
    BoneIndex::LeftLittleProximal,
    BoneIndex::LeftLittleIntermediate,
    BoneIndex::LeftLittleDistal,
];

/// Bone pose in host coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoneTransform {
    /// Position `[x, y, z]`.
    pub translation: [f32; 3],
    /// Rotation quaternion `[x, y, z, w]`.
    pub rotation: [f32; 4],
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl BoneTransform {
    /// Origin with no rotation.
    pub const IDENTITY: Self = Self {
        translation: [0.0; 3],
        rotation: [0.0, 0.0, 0.0, 1.0],
    };

    /// Convert a vendor bone.
    pub fn from_vendor(bone: &MocapBone) -> Self {
        let p = bone.position;
        let q = bone.rotation;
        Self {
            translation: [p.x, p.z, -p.y],
            rotation: [q.x, q.z, -q.y, q.w],
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use teslasuit_api::{Quat, Vec3f};

    use super::*;

    #[test]
    fn test_tracked_bones_are_distinct() {
        let unique: BTreeSet<BoneIndex> = TRACKED_BONES.iter().copied().collect();
        assert_eq!(unique.len(), TRACKED_BONES.len());
        assert!(!unique.contains(&BoneIndex::Head));
        assert!(!unique.contains(&BoneIndex::LeftShoulder));
    }

    #[test]
    fn test_axes_are_swapped() {
        let bone = MocapBone {
            position: Vec3f { x: 1.0, y: 2.0, z: 3.0 },
            rotation: Quat { w: 0.5, x: 0.1, y: 0.2, z: 0.3 },
        };
        let t = BoneTransform::from_vendor(&bone);
        assert_eq!(t.translation, [1.0, 3.0, -2.0]);
        assert_eq!(t.rotation, [0.1, 0.3, -0.2, 0.5]);
    }

    #[test]
    fn test_default_vendor_bone_is_identity() {
        assert_eq!(BoneTransform::from_vendor(&MocapBone::default()), BoneTransform {
            translation: [0.0, 0.0, -0.0],
            rotation: [0.0, 0.0, -0.0, 1.0],
        });
    }
}
