/// Score and lives bookkeeping, one ledger per player.

use super::rules::ScoreEvent;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Score {
    points: u32,
}

impl Score {
    pub fn points(&self) -> u32 { self.points }

    pub fn add(&mut self, points: u32) {
        self.points = self.points.saturating_add(points);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lives {
    count: u32,
    extra_life_score: u32,
    extra_awarded: bool,
}

impl Lives {
    pub fn new(count: u32, extra_life_score: u32) -> Self {
        Lives { count, extra_life_score, extra_awarded: false }
    }

    pub fn count(&self) -> u32 { self.count }

    /// Take one life. Returns whether any remain.
    pub fn lose_life(&mut self) -> bool {
        self.count = self.count.saturating_sub(1);
        self.count > 0
    }

    /// Grant the one-off extra life once `score` reaches the threshold.
    /// Returns true on the call that grants it.
    fn check_extra(&mut self, score: u32) -> bool {
        if self.extra_awarded || score < self.extra_life_score { return false; }
        self.extra_awarded = true;
        self.count += 1;
        true
    }
}

#[derive(Clone, Debug)]
pub struct Ledger {
    pub score: Score,
    pub lives: Lives,
}

impl Ledger {
    pub fn new(start_lives: u32, extra_life_score: u32) -> Self {
        Ledger { score: Score::default(), lives: Lives::new(start_lives, extra_life_score) }
    }

    /// Credit a scoring event. Returns true if it earned the extra life.
    pub fn award(&mut self, event: ScoreEvent) -> bool {
        self.score.add(event.points());
        self.lives.check_extra(self.score.points())
    }

    pub fn is_out(&self) -> bool {
        self.lives.count() == 0
    }
}
