/// Effects emitted during a simulation tick.
/// The shell drains these for sound, explosions and scene changes.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SoundCue {
    Shot,
    Explosion,
    Pickup,
}

impl SoundCue {
    pub fn name(self) -> &'static str {
        match self {
            SoundCue::Shot => "shot",
            SoundCue::Explosion => "explosion",
            SoundCue::Pickup => "pickup",
        }
    }
}

impl fmt::Display for SoundCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SceneRequest {
    GameOver { score_p1: u32, score_p2: u32 },
}

impl SceneRequest {
    pub fn scene_id(&self) -> &'static str {
        match self {
            SceneRequest::GameOver { .. } => "gameover",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Effect {
    Sound(SoundCue),
    Explosion { x: usize, y: usize },
    Scene(SceneRequest),
}
