//! Voice Queries

/// 列出所有音色查询
#[derive(Debug, Clone)]
pub struct ListVoices;

/// 按显示名解析音色 ID；未指定时取目录中的第一个
#[derive(Debug, Clone, Default)]
pub struct ResolveVoice {
    pub name: Option<String>,
}
