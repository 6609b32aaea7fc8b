/// Tile kinds and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.
///
/// | kind     | nobbin | hobbin | bullet  | player enters      |
/// |----------|--------|--------|---------|--------------------|
/// | Dirt     | no     | yes    | stops   | digs → Tunnel      |
/// | Tunnel   | yes    | yes    | passes  | -                  |
/// | Emerald  | no     | yes    | passes  | collects → Tunnel  |
/// | GoldBag  | no     | no     | stops   | bag subsystem      |
/// | Spawn    | no     | no     | passes  | -                  |

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Tile {
    #[default]
    Dirt,
    Tunnel,
    Emerald,
    GoldBag,
    Spawn, // enemy entry marker; enemies leave it but never re-enter
}

impl Tile {
    /// Open cell. Nobbins walk only these.
    pub fn is_open(self) -> bool {
        matches!(self, Tile::Tunnel)
    }

    /// Can a hobbin eat its way through this tile?
    pub fn is_diggable(self) -> bool {
        matches!(self, Tile::Dirt | Tile::Emerald)
    }

    /// Does this tile end a bullet's flight?
    pub fn stops_bullets(self) -> bool {
        matches!(self, Tile::Dirt | Tile::GoldBag)
    }

    /// Does a hobbin standing here turn it into tunnel?
    pub fn is_eaten_by_hobbin(self) -> bool {
        matches!(self, Tile::Dirt | Tile::Emerald | Tile::GoldBag)
    }
}
