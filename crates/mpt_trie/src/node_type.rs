use std::fmt;

/// Node types for MPT Trie nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NodeType {
    Branch = 0x00,
    Extension = 0x01,
    Leaf = 0x02,
}

impl NodeType {
    /// Number of items in this node's list encoding
    pub fn item_count(self) -> usize {
        match self {
            NodeType::Branch => mpt_config::BRANCH_ITEM_COUNT,
            NodeType::Extension | NodeType::Leaf => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            NodeType::Branch => "branch",
            NodeType::Extension => "extension",
            NodeType::Leaf => "leaf",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_type_values() {
        assert_eq!(NodeType::Branch as u8, 0x00);
        assert_eq!(NodeType::Extension as u8, 0x01);
        assert_eq!(NodeType::Leaf as u8, 0x02);
    }

    #[test]
    fn test_item_counts() {
        assert_eq!(NodeType::Branch.item_count(), 17);
        assert_eq!(NodeType::Leaf.item_count(), 2);
        assert_eq!(NodeType::Extension.to_string(), "extension");
    }
}
