#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use vsr_core::{Action, BodyId, Point, SenseAction, SenseKind};

/// A per-cell sensor: turns the cell's voxel into a sense action each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum Sensor {
    Velocity {
        direction: f64,
    },
    AreaRatio,
    Angle,
    Nfc {
        #[cfg_attr(feature = "serde", serde(default))]
        displacement: Point,
        direction: f64,
        #[cfg_attr(feature = "serde", serde(default))]
        channel: u16,
    },
}

impl Sensor {
    pub fn kind(&self) -> SenseKind {
        match *self {
            Sensor::Velocity { direction } => SenseKind::Velocity { direction },
            Sensor::AreaRatio => SenseKind::AreaRatio,
            Sensor::Angle => SenseKind::Angle,
            Sensor::Nfc {
                displacement,
                direction,
                channel,
            } => SenseKind::Nfc {
                displacement,
                direction,
                channel,
            },
        }
    }

    pub fn to_action(&self, body: BodyId) -> Action {
        Action::Sense(SenseAction::new(body, self.kind()))
    }
}
