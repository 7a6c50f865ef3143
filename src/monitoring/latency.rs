//! エンドポイント別のAPIレイテンシ

use std::collections::{HashMap, VecDeque};

/// エンドポイントごとの最新レイテンシ
///
/// 上限が設定されていなければ無制限。上限がある場合は、最も古く書き込まれた
/// エンドポイントから削除します。
#[derive(Debug, Default)]
pub struct ApiLatencyMap {
    timings: HashMap<String, f64>,
    order: VecDeque<String>,
    max_endpoints: Option<usize>,
}

impl ApiLatencyMap {
    pub fn new(max_endpoints: Option<usize>) -> Self {
        Self {
            timings: HashMap::new(),
            order: VecDeque::new(),
            max_endpoints,
        }
    }

    /// 値を記録（後勝ち）し、削除されたエンドポイントがあれば返す
    pub fn record(&mut self, endpoint: &str, latency_ms: f64) -> Option<String> {
        let replaced = self.timings.insert(endpoint.to_string(), latency_ms).is_some();
        let max = self.max_endpoints?;

        // 書き込み順は上限付きの場合のみ保持
        if replaced {
            if let Some(pos) = self.order.iter().position(|e| e == endpoint) {
                self.order.remove(pos);
            }
        }
        self.order.push_back(endpoint.to_string());

        if self.timings.len() > max {
            let evicted = self.order.pop_front()?;
            self.timings.remove(&evicted);
            return Some(evicted);
        }
        None
    }

    pub fn get(&self, endpoint: &str) -> Option<f64> {
        self.timings.get(endpoint).copied()
    }

    pub fn len(&self) -> usize {
        self.timings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timings.is_empty()
    }

    pub fn clear(&mut self) {
        self.timings.clear();
        self.order.clear();
    }

    pub fn snapshot(&self) -> HashMap<String, f64> {
        self.timings.clone()
    }
}
