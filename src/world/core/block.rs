use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a block type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct BlockId(pub u16);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Display block name if it's a known block
        match *self {
            BlockId::STONE => write!(f, "Stone"),
            BlockId::DIRT => write!(f, "Dirt"),
            BlockId::SAND => write!(f, "Sand"),
            BlockId::GRASS => write!(f, "Grass Block"),
            BlockId::WATER => write!(f, "Water"),
            BlockId::BEDROCK => write!(f, "Bedrock"),
            BlockId::UNKNOWN => write!(f, "Unknown"),
            _ => write!(f, "Block({})", self.0),
        }
    }
}

impl BlockId {
    pub const STONE: BlockId = BlockId(1);
    pub const DIRT: BlockId = BlockId(2);
    pub const SAND: BlockId = BlockId(3);
    pub const GRASS: BlockId = BlockId(4);
    pub const WATER: BlockId = BlockId(5);
    pub const BEDROCK: BlockId = BlockId(6);
    pub const UNKNOWN: BlockId = BlockId(7);

    /// Create a new BlockId from a raw u16 value
    pub const fn new(id: u16) -> Self {
        BlockId(id)
    }
}

/// Static properties of a block type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockProperties {
    /// Seconds to break. `f64::INFINITY` for unbreakable types.
    pub hardness: f64,
    pub breakable: bool,
    /// Liquids are not solid: they pass light and entities
    pub liquid: bool,
}

impl BlockProperties {
    pub const fn breakable(hardness: f64) -> Self {
        Self {
            hardness,
            breakable: true,
            liquid: false,
        }
    }

    pub const fn unbreakable(liquid: bool) -> Self {
        Self {
            hardness: f64::INFINITY,
            breakable: false,
            liquid,
        }
    }
}

/// Built-in block table, registered by every `BlockRegistry`
pub const BUILTIN_BLOCKS: [(BlockId, &str, BlockProperties); 7] = [
    (BlockId::STONE, "stone", BlockProperties::breakable(1.5)),
    (BlockId::DIRT, "dirt", BlockProperties::breakable(0.8)),
    (BlockId::SAND, "sand", BlockProperties::breakable(0.4)),
    (BlockId::GRASS, "grass_block", BlockProperties::breakable(0.6)),
    (BlockId::WATER, "water", BlockProperties::unbreakable(true)),
    (BlockId::BEDROCK, "bedrock", BlockProperties::unbreakable(false)),
    (BlockId::UNKNOWN, "unknown", BlockProperties::breakable(1.0)),
];

/// A single occupied cell. Empty cells are `None` in chunk storage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block {
    pub id: BlockId,
    pub hardness: f64,
    pub breakable: bool,
    liquid: bool,
}

impl Block {
    pub const STONE: Block = Block::from_properties(BlockId::STONE, BUILTIN_BLOCKS[0].2);
    pub const DIRT: Block = Block::from_properties(BlockId::DIRT, BUILTIN_BLOCKS[1].2);
    pub const SAND: Block = Block::from_properties(BlockId::SAND, BUILTIN_BLOCKS[2].2);
    pub const GRASS: Block = Block::from_properties(BlockId::GRASS, BUILTIN_BLOCKS[3].2);
    pub const WATER: Block = Block::from_properties(BlockId::WATER, BUILTIN_BLOCKS[4].2);
    pub const BEDROCK: Block = Block::from_properties(BlockId::BEDROCK, BUILTIN_BLOCKS[5].2);
    pub const UNKNOWN: Block = Block::from_properties(BlockId::UNKNOWN, BUILTIN_BLOCKS[6].2);

    pub const fn from_properties(id: BlockId, properties: BlockProperties) -> Self {
        Self {
            id,
            hardness: properties.hardness,
            breakable: properties.breakable,
            liquid: properties.liquid,
        }
    }

    pub fn is_water(&self) -> bool {
        self.id == BlockId::WATER
    }

    pub fn is_liquid(&self) -> bool {
        self.liquid
    }

    /// Solid blocks stop skylight propagation and collide with entities
    pub fn is_solid(&self) -> bool {
        !self.liquid
    }
}

/// Whether a cell is empty or liquid, i.e. passable
#[inline]
pub fn is_passable(cell: Option<Block>) -> bool {
    cell.map_or(true, |block| !block.is_solid())
}
