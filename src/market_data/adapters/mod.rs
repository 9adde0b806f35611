pub mod dragonex;

pub use dragonex::DragonexSource;
