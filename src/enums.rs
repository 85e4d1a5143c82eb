use serde::{Deserialize, Serialize};

/// Role tag carried by every body in a level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyRole {
    Player,
    Hazard,
    Goal,
    Scenery,
    /// Special hazard that escalates the level's distortion counter
    Distortion,
}

/// How the physics stand-in moves a body
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyKind {
    Static,
    /// Position driven by an `Oscillator`, unaffected by forces
    Kinematic,
    /// Integrated under gravity and forces
    Dynamic,
}

/// Discrete player intent produced by the input mapper
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    Jump,
    MoveLeft,
    MoveRight,
}

/// Why a level attempt failed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailReason {
    HazardContact,
}

/// Result reported upward to the progression layer. Never stored by the core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelOutcome {
    InProgress,
    Completed { next_level: u32 },
    Failed(FailReason),
}

/// Begin/end half of a contact
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactPhase {
    Begin,
    End,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_role_json_names() {
        let json = serde_json::to_string(&BodyRole::Distortion).unwrap();
        assert_eq!(json, "\"distortion\"");

        let role: BodyRole = serde_json::from_str("\"hazard\"").unwrap();
        assert_eq!(role, BodyRole::Hazard);
    }
}
