use super::block::{Block, BlockId, BlockProperties, BUILTIN_BLOCKS};
use crate::error::{EngineError, EngineResult};
use rustc_hash::FxHashMap;

/// Properties given to block names first seen in a saved chunk
const DISCOVERED_BLOCK_PROPERTIES: BlockProperties = BlockProperties::breakable(1.0);

/// Registry that stores all block types as data
///
/// Maps between ids, persisted names and properties. Names are what the
/// archive stores, so they must stay stable across versions.
pub struct BlockRegistry {
    /// Map from BlockId to properties
    blocks: FxHashMap<BlockId, BlockProperties>,
    /// Map from name to BlockId
    name_to_id: FxHashMap<String, BlockId>,
    /// Map from BlockId to persisted name
    id_to_name: FxHashMap<BlockId, String>,
    next_id: u16,
}

impl BlockRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            blocks: FxHashMap::default(),
            name_to_id: FxHashMap::default(),
            id_to_name: FxHashMap::default(),
            next_id: 100, // 1-99 reserved for built-in blocks
        };

        // Register built-in blocks from the static table
        for (id, name, properties) in BUILTIN_BLOCKS {
            registry.insert(id, name, properties);
        }

        registry
    }

    fn insert(&mut self, id: BlockId, name: &str, properties: BlockProperties) {
        self.blocks.insert(id, properties);
        self.name_to_id.insert(name.to_string(), id);
        self.id_to_name.insert(id, name.to_string());
    }

    /// Register a new block type with properties
    pub fn register_block(
        &mut self,
        name: &str,
        properties: BlockProperties,
    ) -> EngineResult<BlockId> {
        if name.is_empty() || name == crate::constants::persistence::AIR_TOKEN {
            return Err(EngineError::InvalidConfig {
                field: "block_name".to_string(),
                value: name.to_string(),
                reason: "reserved or empty block name".to_string(),
            });
        }
        // Names are RLE tokens: they must not contain the run or segment separators
        if name.contains('*') || name.chars().any(char::is_whitespace) {
            return Err(EngineError::InvalidConfig {
                field: "block_name".to_string(),
                value: name.to_string(),
                reason: "block names may not contain '*' or whitespace".to_string(),
            });
        }
        if let Some(existing) = self.name_to_id.get(name) {
            log::warn!(
                "[BlockRegistry::register_block] '{}' already registered as {}",
                name,
                existing.0
            );
            return Ok(*existing);
        }
        if self.next_id == u16::MAX {
            return Err(EngineError::InvalidBlockType { id: self.next_id });
        }

        let id = BlockId(self.next_id);
        self.next_id += 1;
        self.insert(id, name, properties);

        log::info!(
            "[BlockRegistry::register_block] Registered block '{}' with ID {}",
            name,
            id.0
        );
        Ok(id)
    }

    /// Get block properties by ID
    pub fn get_properties(&self, id: BlockId) -> Option<&BlockProperties> {
        self.blocks.get(&id)
    }

    /// Get a block ID by name
    pub fn get_id(&self, name: &str) -> Option<BlockId> {
        self.name_to_id.get(name).copied()
    }

    /// Persisted name of a block ID
    pub fn get_name(&self, id: BlockId) -> Option<&str> {
        self.id_to_name.get(&id).map(String::as_str)
    }

    /// Build the block value for an ID
    pub fn block(&self, id: BlockId) -> Option<Block> {
        self.get_properties(id)
            .map(|properties| Block::from_properties(id, *properties))
    }

    /// Resolve a persisted name, registering names this registry has not seen
    ///
    /// Saved worlds may hold blocks registered by another session. Keeping
    /// the name means the next save writes it back unchanged. Names that
    /// cannot be registered resolve to `unknown`.
    pub fn resolve_or_register(&mut self, name: &str) -> Block {
        if let Some(block) = self.get_id(name).and_then(|id| self.block(id)) {
            return block;
        }

        match self.register_block(name, DISCOVERED_BLOCK_PROPERTIES) {
            Ok(id) => Block::from_properties(id, DISCOVERED_BLOCK_PROPERTIES),
            Err(e) => {
                log::warn!(
                    "[BlockRegistry::resolve_or_register] Cannot keep block name '{}' ({}), substituting unknown",
                    name,
                    e
                );
                Block::UNKNOWN
            }
        }
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}
