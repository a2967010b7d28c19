//! Calibration data
//!
//! Rows are the rig displacement (or rotation) reached when a channel sits
//! at full intensity. Facial rows are sparse over the 25 facial targets;
//! eyelid rows are Euler rotations, in radians, of the four eyelid targets.

use rigstream_core::{MappingError, Vec3, EYELID_TARGET_COUNT, FACIAL_TARGET_COUNT};

use crate::MappingTable;

/// Channel rotating the jaw towards the left
pub const JAW_LEFT: &str = "JawLeft";

/// Channel rotating the jaw towards the right
pub const JAW_RIGHT: &str = "JawRight";

/// Jaw yaw at full `JawLeft` intensity
pub const JAW_LEFT_DEGREES: f32 = 8.0;

/// Jaw yaw at full `JawRight` intensity
pub const JAW_RIGHT_DEGREES: f32 = -8.0;

/// Facial controller displacements at full intensity, sparse `(target, xyz)`
pub const FACIAL_ROWS: &[(&str, &[(usize, [f32; 3])])] = &[
    ("BrowsD_R", &[(0, [0.0, 0.0, 0.1]), (2, [0.0, 0.0, 0.25]), (4, [0.0, 0.0, 0.15])]),
    ("BrowsD_L", &[(0, [0.0, 0.0, 0.1]), (1, [0.0, 0.0, 0.25]), (3, [0.0, 0.0, 0.15])]),
    ("BrowsU_C", &[(1, [0.0, 0.0, -0.15]), (2, [0.0, 0.0, -0.15])]),
    ("BrowsU_L", &[(3, [0.0, 0.0, -0.15])]),
    ("BrowsU_R", &[(4, [0.0, 0.0, -0.15])]),
    ("BrowsSqueeze", &[(0, [0.0, 0.0, 0.15])]),
    (
        "JawOpen",
        &[
            (10, [0.1, 0.0, 0.0]),
            (11, [-0.1, 0.0, 0.0]),
            (16, [0.0, 0.0, 0.06]),
            (17, [0.0, 0.0, 0.06]),
            (21, [0.1, 0.0, 0.0]),
            (22, [-0.1, 0.0, 0.0]),
            (24, [0.0, 0.0, 0.25]),
        ],
    ),
    (
        "JawChew",
        &[
            (12, [0.0, 0.0, 0.18]),
            (13, [0.0, 0.0, 0.1]),
            (14, [0.0, 0.0, 0.1]),
            (15, [0.0, 0.0, -0.077]),
            (16, [0.0, 0.0, -0.22]),
            (17, [0.0, 0.0, -0.22]),
            (19, [0.0, 0.0, 0.06]),
            (20, [0.0, 0.0, 0.06]),
            (21, [0.05, 0.0, 0.0]),
            (22, [-0.05, 0.0, 0.0]),
            (24, [0.0, 0.0, 0.035]),
        ],
    ),
    ("LipsUpperUp_L", &[(13, [0.0, 0.0, -0.25]), (16, [0.0, 0.0, 0.025]), (21, [0.0, 0.0, -0.06])]),
    ("LipsUpperUp_R", &[(14, [0.0, 0.0, -0.25]), (17, [0.0, 0.0, 0.025]), (22, [0.0, 0.0, -0.06])]),
    ("LipsLowerDown_L", &[(16, [0.0, 0.0, 0.25]), (24, [0.0, 0.0, 0.006])]),
    ("LipsLowerDown_R", &[(17, [0.0, 0.0, 0.25]), (24, [0.0, 0.0, 0.006])]),
    ("LipsUpperClose", &[(12, [0.0, 0.0, 0.25])]),
    ("LipsLowerClose", &[(15, [0.0, 0.0, 0.15])]),
    (
        "MouthSmile_L",
        &[
            (10, [-0.15, 0.0, -0.15]),
            (12, [0.0, 0.0, 0.1]),
            (15, [0.0, 0.0, 0.02]),
            (16, [0.0, 0.0, -0.025]),
            (19, [-0.2, 0.0, -0.06]),
            (21, [-0.12, 0.0, -0.25]),
        ],
    ),
    (
        "MouthSmile_R",
        &[
            (11, [0.15, 0.0, -0.15]),
            (12, [0.0, 0.0, 0.1]),
            (15, [0.0, 0.0, 0.02]),
            (17, [0.0, 0.0, -0.025]),
            (20, [0.2, 0.0, -0.06]),
            (22, [0.12, 0.0, -0.25]),
        ],
    ),
    (
        "MouthDimple_L",
        &[
            (10, [-0.1, 0.0, 0.0]),
            (12, [0.0, 0.0, 0.05]),
            (15, [0.0, 0.0, 0.05]),
            (19, [-0.2, 0.0, -0.025]),
            (21, [-0.2, 0.0, -0.15]),
        ],
    ),
    (
        "MouthDimple_R",
        &[
            (11, [0.1, 0.0, 0.0]),
            (12, [0.0, 0.0, 0.05]),
            (15, [0.0, 0.0, 0.05]),
            (20, [0.2, 0.0, -0.025]),
            (22, [0.2, 0.0, -0.15]),
        ],
    ),
    ("LipsStretch_L", &[(10, [-0.1, 0.0, 0.0]), (19, [-0.15, 0.0, 0.0]), (21, [-0.25, 0.0, 0.18])]),
    ("LipsStretch_R", &[(11, [0.1, 0.0, 0.0]), (20, [0.15, 0.0, 0.0]), (22, [0.25, 0.0, 0.18])]),
    ("MouthFrown_L", &[(13, [0.0, 0.0, 0.05]), (19, [-0.15, 0.0, 0.0]), (21, [-0.085, 0.0, 0.17])]),
    ("MouthFrown_R", &[(14, [0.0, 0.0, 0.05]), (20, [0.15, 0.0, 0.0]), (22, [0.085, 0.0, 0.17])]),
    (
        "MouthPress_L",
        &[
            (10, [-0.15, 0.0, 0.0]),
            (16, [0.0, 0.0, -0.08]),
            (19, [0.0, 0.0, -0.075]),
            (21, [-0.05, 0.0, -0.2]),
        ],
    ),
    (
        "MouthPress_R",
        &[
            (11, [0.15, 0.0, 0.0]),
            (17, [0.0, 0.0, -0.08]),
            (20, [0.0, 0.0, -0.075]),
            (22, [0.05, 0.0, -0.2]),
        ],
    ),
    (
        "LipsPucker",
        &[
            (12, [0.0, 0.0, -0.25]),
            (13, [0.0, 0.0, 0.07]),
            (14, [0.0, 0.0, 0.07]),
            (15, [0.0, 0.0, -0.22]),
            (16, [0.0, 0.0, -0.05]),
            (17, [0.0, 0.0, -0.05]),
            (18, [0.0, 0.0, -0.18]),
            (21, [0.17, 0.0, 0.0]),
            (22, [-0.17, 0.0, 0.0]),
            (24, [0.0, 0.0, 0.005]),
        ],
    ),
    (
        "LipsFunnel",
        &[
            (12, [0.0, 0.0, -0.2]),
            (13, [0.0, 0.0, -0.1]),
            (14, [0.0, 0.0, -0.1]),
            (15, [0.0, 0.0, -0.02]),
            (16, [0.0, 0.0, 0.1]),
            (17, [0.0, 0.0, 0.1]),
            (18, [0.0, 0.0, -0.25]),
            (21, [0.2, 0.0, 0.0]),
            (22, [-0.2, 0.0, 0.0]),
        ],
    ),
    (
        "MouthLeft",
        &[
            (17, [0.0, 0.0, -0.1]),
            (19, [-0.1, 0.0, -0.06]),
            (21, [-0.18, 0.0, -0.25]),
            (22, [-0.15, 0.0, -0.08]),
        ],
    ),
    (
        "MouthRight",
        &[
            (16, [0.0, 0.0, -0.1]),
            (20, [0.1, 0.0, -0.06]),
            (21, [0.15, 0.0, -0.08]),
            (22, [0.18, 0.0, -0.25]),
        ],
    ),
    (
        "ChinLowerRaise",
        &[
            (15, [0.0, 0.0, -0.22]),
            (16, [0.0, 0.0, -0.2]),
            (17, [0.0, 0.0, -0.2]),
            (21, [0.0, 0.0, -0.05]),
            (22, [0.0, 0.0, -0.05]),
        ],
    ),
    (
        "ChinUpperRaise",
        &[
            (12, [0.0, 0.0, 0.05]),
            (13, [0.0, 0.0, -0.21]),
            (14, [0.0, 0.0, -0.21]),
            (21, [0.0, 0.0, -0.05]),
            (22, [0.0, 0.0, -0.05]),
        ],
    ),
    (
        "Sneer_L",
        &[
            (0, [0.0, 0.0, 0.2]),
            (1, [0.0, 0.0, 0.05]),
            (2, [0.0, 0.0, 0.05]),
            (9, [0.0, 0.0, -0.25]),
        ],
    ),
    (
        "Sneer_R",
        &[
            (0, [0.0, 0.0, 0.2]),
            (1, [0.0, 0.0, 0.05]),
            (2, [0.0, 0.0, 0.05]),
            (9, [0.0, 0.0, -0.25]),
        ],
    ),
    (
        "Puff",
        &[
            (10, [-0.25, 0.0, 0.0]),
            (11, [0.25, 0.0, 0.0]),
            (12, [0.0, 0.0, -0.098]),
            (15, [0.0, 0.0, -0.103]),
            (21, [0.112, 0.0, 0.0]),
            (22, [-0.112, 0.0, 0.0]),
        ],
    ),
    ("CheekSquint_L", &[(3, [0.0, 0.0, 0.05]), (10, [0.0, 0.0, -0.25])]),
    ("CheekSquint_R", &[(4, [0.0, 0.0, 0.05]), (11, [0.0, 0.0, -0.25])]),
];

/// Eyelid controller euler rotations (radians) at full intensity
pub const EYELID_ROWS: &[(&str, [[f32; 3]; EYELID_TARGET_COUNT])] = &[
    (
        "EyeBlink_R",
        [[0.0, 0.0, 0.0], [0.436, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]],
    ),
    (
        "EyeBlink_L",
        [[0.436, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]],
    ),
    (
        "EyeSquint_R",
        [[0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [-0.156, 0.0, 0.0]],
    ),
    (
        "EyeSquint_L",
        [[0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [-0.156, 0.0, 0.0], [0.0, 0.0, 0.0]],
    ),
    (
        "EyeDown_R",
        [[0.0, 0.0, 0.0], [0.188, 0.0, 0.0], [0.0, 0.0, 0.0], [0.409, 0.0, 0.0]],
    ),
    (
        "EyeDown_L",
        [[0.188, 0.0, 0.0], [0.0, 0.0, 0.0], [0.409, 0.0, 0.0], [0.0, 0.0, 0.0]],
    ),
    (
        "EyeOpen_R",
        [[0.0, 0.0, 0.0], [-0.516, 0.0, 0.0], [0.0, 0.0, 0.0], [0.147, 0.0, 0.0]],
    ),
    (
        "EyeOpen_L",
        [[-0.516, 0.0, 0.0], [0.0, 0.0, 0.0], [0.147, 0.0, 0.0], [0.0, 0.0, 0.0]],
    ),
    (
        "EyeUp_R",
        [[0.0, 0.0, 0.0], [-0.516, 0.0, 0.0], [0.0, 0.0, 0.0], [-0.049, 0.0, 0.0]],
    ),
    (
        "EyeUp_L",
        [[-0.516, 0.0, 0.0], [0.0, 0.0, 0.0], [-0.049, 0.0, 0.0], [0.0, 0.0, 0.0]],
    ),
];

/// Facial displacement table (25 targets)
pub fn facial_table() -> Result<MappingTable, MappingError> {
    MappingTable::from_sparse(FACIAL_TARGET_COUNT, FACIAL_ROWS)
}

/// Eyelid rotation table (4 targets)
pub fn eyelid_table() -> Result<MappingTable, MappingError> {
    MappingTable::from_dense(
        EYELID_TARGET_COUNT,
        EYELID_ROWS
            .iter()
            .map(|(name, row)| (*name, row.iter().copied().map(Vec3::from_array).collect())),
    )
}
