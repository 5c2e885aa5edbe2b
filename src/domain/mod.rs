//! Domain Layer - 领域层
//!
//! 纯函数式的文本分片逻辑，不依赖网络、磁盘或全局状态

pub mod fragmenter;

pub use fragmenter::{
    index_fragments, split, split_text, Fragment, FragmentError, FragmentLimit,
    DEFAULT_MAX_CHARS,
};
