//! Bone hierarchy with bind pose positions

use crate::foundation::math::Vec3;

/// One bone of a skeleton
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    /// Bone name
    pub name: String,
    /// Index of the parent bone, `None` for roots
    pub parent: Option<usize>,
    /// Bind pose position in model space
    pub position: Vec3,
}

/// Ordered bone list; a bone's index is its identity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    bones: Vec<Bone>,
}

impl Skeleton {
    /// Empty skeleton
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from bones whose parents may refer to any index
    ///
    /// Parent links that point outside the list or at the bone itself are
    /// dropped, turning that bone into a root.
    pub fn from_bones(mut bones: Vec<Bone>) -> Self {
        let count = bones.len();
        for (idx, bone) in bones.iter_mut().enumerate() {
            if bone.parent.is_some_and(|parent| parent >= count || parent == idx) {
                log::debug!("Bone '{}' has an invalid parent, treating it as a root", bone.name);
                bone.parent = None;
            }
        }

        Self { bones }
    }

    /// Append a bone, returning its index
    pub fn add_bone(&mut self, name: impl Into<String>, parent: Option<usize>, position: Vec3) -> usize {
        let idx = self.bones.len();
        self.bones.push(Bone {
            name: name.into(),
            parent: parent.filter(|&p| p < idx),
            position,
        });
        idx
    }

    /// Number of bones
    pub fn bones_count(&self) -> usize {
        self.bones.len()
    }

    /// Whether the skeleton has no bones
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// All bones
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// Bone at `idx`
    pub fn bone(&self, idx: usize) -> Option<&Bone> {
        self.bones.get(idx)
    }

    /// Index of the bone called `name`
    pub fn bone_idx(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|bone| bone.name == name)
    }

    /// Parent index of bone `idx`
    pub fn bone_parent_idx(&self, idx: usize) -> Option<usize> {
        self.bones.get(idx)?.parent
    }

    /// Bind pose position of bone `idx`
    pub fn bone_pos(&self, idx: usize) -> Option<Vec3> {
        self.bones.get(idx).map(|bone| bone.position)
    }

    /// Bind pose offset of bone `idx` from its parent (model space for roots)
    pub fn bone_offset(&self, idx: usize) -> Option<Vec3> {
        let bone = self.bones.get(idx)?;
        match bone.parent.and_then(|parent| self.bones.get(parent)) {
            Some(parent) => Some(bone.position - parent.position),
            None => Some(bone.position),
        }
    }
}
