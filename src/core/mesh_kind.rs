/// The fixed catalog of clipmap tile meshes.
///
/// Discriminants are mesh indices; consumers index the mesh table
/// positionally so the order must not change.
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MeshKind {
    Cross = 0,
    Square = 1,
    Filler = 2,
    Trim = 3,
    Seam = 4,
}

impl MeshKind {
    pub const COUNT: usize = 5;
    pub const ALL: [MeshKind; Self::COUNT] = [
        MeshKind::Cross,
        MeshKind::Square,
        MeshKind::Filler,
        MeshKind::Trim,
        MeshKind::Seam,
    ];

    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            MeshKind::Cross => "cross",
            MeshKind::Square => "square",
            MeshKind::Filler => "filler",
            MeshKind::Trim => "trim",
            MeshKind::Seam => "seam",
        }
    }

    /// Number of relems the builder emits for this kind
    pub fn relem_count(self) -> u32 {
        match self {
            MeshKind::Cross => 2,
            MeshKind::Square => 1,
            MeshKind::Filler => 4,
            MeshKind::Trim => 2,
            MeshKind::Seam => 1,
        }
    }
}

impl std::fmt::Display for MeshKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
