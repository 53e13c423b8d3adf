//! 能力注册表
//!
//! 执行器在构造时给出「能力名 → 参数个数 / 描述」的显式映射；
//! 通用回退的最长前缀匹配只查询这张表，不依赖具体执行器实现。

use std::collections::HashMap;

/// 单个能力：名称、参数个数（None 表示不定）、描述
#[derive(Debug, Clone, PartialEq)]
pub struct Capability {
    pub name: String,
    pub arity: Option<usize>,
    pub description: String,
}

impl Capability {
    pub fn new(name: impl Into<String>, arity: Option<usize>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arity,
            description: description.into(),
        }
    }
}

/// 能力表：按名称存储，支持 register / contains / get / longest_prefix
#[derive(Debug, Clone, Default)]
pub struct CapabilitySet {
    capabilities: HashMap<String, Capability>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, capability: Capability) {
        self.capabilities
            .insert(capability.name.clone(), capability);
    }

    /// 链式注册，便于构造静态能力表
    pub fn with(mut self, name: &str, arity: Option<usize>, description: &str) -> Self {
        self.register(Capability::new(name, arity, description));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.capabilities.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Capability> {
        self.capabilities.get(name)
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// 按名称排序的能力名列表
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.capabilities.keys().cloned().collect();
        names.sort();
        names
    }

    /// 返回 (name, description) 列表，用于启动日志
    pub fn descriptions(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = self
            .capabilities
            .values()
            .map(|c| (c.name.clone(), c.description.clone()))
            .collect();
        out.sort();
        out
    }

    /// 在 segments 的所有前缀长度 1..=len 上查找能力名，返回最长匹配所占的段数。
    /// 必须扫描全部长度：能力名本身可能含下划线（set_lift_height 不能在 "set" 处停下）。
    pub fn longest_prefix(&self, segments: &[&str]) -> Option<usize> {
        let mut best = None;
        for len in 1..=segments.len() {
            if self.contains(&segments[..len].join("_")) {
                best = Some(len);
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps() -> CapabilitySet {
        CapabilitySet::new()
            .with("foo", None, "short")
            .with("foo_bar", Some(2), "long")
            .with("set_lift_height", Some(2), "lift")
    }

    #[test]
    fn test_longest_prefix_prefers_longer_name() {
        let caps = caps();
        assert_eq!(caps.longest_prefix(&["foo", "bar", "1", "2"]), Some(2));
        assert_eq!(caps.longest_prefix(&["foo", "1", "2"]), Some(1));
    }

    #[test]
    fn test_longest_prefix_skips_non_matching_shorter_prefixes() {
        let caps = caps();
        assert_eq!(
            caps.longest_prefix(&["set", "lift", "height", "0.5", "1"]),
            Some(3)
        );
    }

    #[test]
    fn test_longest_prefix_none() {
        let caps = caps();
        assert_eq!(caps.longest_prefix(&["wiggle", "3"]), None);
        assert_eq!(caps.longest_prefix(&[]), None);
    }

    #[test]
    fn test_whole_token_can_be_a_capability() {
        let caps = caps();
        assert_eq!(caps.longest_prefix(&["foo", "bar"]), Some(2));
    }

    #[test]
    fn test_names_sorted() {
        assert_eq!(caps().names(), vec!["foo", "foo_bar", "set_lift_height"]);
        assert_eq!(caps().len(), 3);
    }
}
