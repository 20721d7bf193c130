// ============================================================
// Layer 4 — Body-Part Decomposition
// ============================================================
// A pose vector in the HumanML3D / KIT-ML feature layout for a
// skeleton with J joints is laid out as:
//
//   [ root (4) | ric (J-1)*3 | rot (J-1)*6 | vel J*3 | feet (4) ]
//
//   root  — rotation velocity, xz linear velocity, height
//   ric   — root-relative position of joints 1..J
//   rot   — 6D rotation of joints 1..J
//   vel   — local velocity of joints 0..J
//   feet  — contact flags, two left then two right
//
// JointPartSplitter groups these channels into six parts:
//
//   Root     = root (4) + vel of joint 0 (3)
//   R_Leg    = ric/rot/vel of the right leg joints + right feet
//   L_Leg    = ric/rot/vel of the left leg joints  + left feet
//   Backbone = ric/rot/vel of the spine joints
//   R_Arm    = ric/rot/vel of the right arm joints
//   L_Arm    = ric/rot/vel of the left arm joints
//
// Both arms start at a spine joint that also belongs to the
// backbone, so that joint is copied into three parts. Merging
// resolves the copies with a SharedJointPolicy.
//
// Reference: HumanML3D motion representation (Guo et al. 2022)
//            ParCo part-coordinated motion generation

use ndarray::{Array2, Axis};

use crate::domain::traits::{PartSplitter, SharedJointPolicy, NUM_PARTS};
use crate::domain::variant::DatasetVariant;

const ROOT_CHANNELS: usize = 4;
const CONTACT_CHANNELS: usize = 4;
const BACKBONE: usize = 3;

/// Splits poses by a joint-to-part table.
#[derive(Debug, Clone)]
pub struct JointPartSplitter {
    pose_dim: usize,
    /// Global channel indices of each part, in part order.
    parts:    Vec<Vec<usize>>,
    /// For every global channel, every (part, column) holding a copy.
    owners:   Vec<Vec<(usize, usize)>>,
}

impl JointPartSplitter {
    /// Splitter for a dataset variant's skeleton.
    pub fn for_variant(variant: DatasetVariant) -> Self {
        match variant {
            DatasetVariant::T2m => Self::from_joints(
                22,
                [
                    &[2, 5, 8, 11],
                    &[1, 4, 7, 10],
                    &[3, 6, 9, 12, 15],
                    &[9, 14, 17, 19, 21],
                    &[9, 13, 16, 18, 20],
                ],
            ),
            DatasetVariant::Kit => Self::from_joints(
                21,
                [
                    &[11, 12, 13, 14, 15],
                    &[16, 17, 18, 19, 20],
                    &[1, 2, 3, 4],
                    &[3, 5, 6, 7],
                    &[3, 8, 9, 10],
                ],
            ),
        }
    }

    /// Build from the non-root joints of R_Leg, L_Leg, Backbone,
    /// R_Arm and L_Arm (in that order). Joint 0 always forms Root.
    pub fn from_joints(joints_num: usize, limbs: [&[usize]; NUM_PARTS - 1]) -> Self {
        let layout = Layout::new(joints_num);

        let mut parts: Vec<Vec<usize>> = Vec::with_capacity(NUM_PARTS);
        parts.push(layout.joint_channels(0));
        for (i, joints) in limbs.iter().enumerate() {
            let mut channels: Vec<usize> = joints.iter().flat_map(|&j| layout.joint_channels(j)).collect();
            match i {
                0 => channels.extend(layout.right_contacts()),
                1 => channels.extend(layout.left_contacts()),
                _ => {}
            }
            parts.push(channels);
        }

        let pose_dim = layout.pose_dim();
        let mut owners = vec![Vec::new(); pose_dim];
        for (p, channels) in parts.iter().enumerate() {
            for (col, &ch) in channels.iter().enumerate() {
                owners[ch].push((p, col));
            }
        }

        Self { pose_dim, parts, owners }
    }

    pub fn pose_dim(&self) -> usize {
        self.pose_dim
    }

    /// Channels that no part covers. Empty for a complete layout.
    pub fn uncovered_channels(&self) -> Vec<usize> {
        (0..self.pose_dim).filter(|&c| self.owners[c].is_empty()).collect()
    }
}

impl PartSplitter for JointPartSplitter {
    fn part_widths(&self) -> [usize; NUM_PARTS] {
        let mut widths = [0; NUM_PARTS];
        for (w, p) in widths.iter_mut().zip(&self.parts) {
            *w = p.len();
        }
        widths
    }

    /// `motion` must be `(frames, pose_dim)`.
    fn split(&self, motion: &Array2<f32>) -> Vec<Array2<f32>> {
        self.parts
            .iter()
            .map(|channels| motion.select(Axis(1), channels))
            .collect()
    }

    fn merge(&self, parts: &[Array2<f32>], policy: SharedJointPolicy) -> Array2<f32> {
        let frames = parts.first().map(|p| p.nrows()).unwrap_or(0);
        let mut whole = Array2::<f32>::zeros((frames, self.pose_dim));

        for (ch, copies) in self.owners.iter().enumerate() {
            if copies.is_empty() {
                continue;
            }
            let backbone_copy = copies.iter().find(|(p, _)| *p == BACKBONE);
            let mut column = whole.column_mut(ch);

            match (policy, backbone_copy) {
                (SharedJointPolicy::Backbone, Some(&(p, col))) => {
                    column.assign(&parts[p].column(col));
                }
                _ => {
                    for &(p, col) in copies {
                        column += &parts[p].column(col);
                    }
                    column /= copies.len() as f32;
                }
            }
        }

        whole
    }
}

// ─── Channel layout ───────────────────────────────────────────────────────────
struct Layout {
    joints_num: usize,
}

impl Layout {
    fn new(joints_num: usize) -> Self {
        Self { joints_num }
    }

    fn ric_start(&self) -> usize {
        ROOT_CHANNELS
    }

    fn rot_start(&self) -> usize {
        self.ric_start() + (self.joints_num - 1) * 3
    }

    fn vel_start(&self) -> usize {
        self.rot_start() + (self.joints_num - 1) * 6
    }

    fn contact_start(&self) -> usize {
        self.vel_start() + self.joints_num * 3
    }

    fn pose_dim(&self) -> usize {
        self.contact_start() + CONTACT_CHANNELS
    }

    /// Every channel describing joint `j`.
    fn joint_channels(&self, j: usize) -> Vec<usize> {
        let vel = self.vel_start() + j * 3;
        if j == 0 {
            return (0..ROOT_CHANNELS).chain(vel..vel + 3).collect();
        }
        let ric = self.ric_start() + (j - 1) * 3;
        let rot = self.rot_start() + (j - 1) * 6;
        (ric..ric + 3).chain(rot..rot + 6).chain(vel..vel + 3).collect()
    }

    fn left_contacts(&self) -> impl Iterator<Item = usize> {
        let c = self.contact_start();
        c..c + 2
    }

    fn right_contacts(&self) -> impl Iterator<Item = usize> {
        let c = self.contact_start() + 2;
        c..c + 2
    }
}
