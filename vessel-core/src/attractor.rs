use glam::Vec3;

/// An attraction point: a sampled tissue location that pulls nearby vessel
/// nodes toward it until some node grows within the kill radius.
///
/// Identity is purely positional. The attraction index may hold several
/// attractions at the same position, and removal matches on exact position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attractor {
    pub pos: Vec3,
}

impl Attractor {
    pub fn new(pos: Vec3) -> Self {
        Self { pos }
    }
}
