//! Fragment Queries

/// 预览分片结果（不调用合成服务）
#[derive(Debug, Clone)]
pub struct PreviewFragments {
    pub text: String,
    pub max_chars: usize,
}
