//! ナビゲーション単位のパフォーマンスサンプルと保持期間付きストア

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 1回のナビゲーションで集計されたパフォーマンス記録
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSample {
    /// `loadEventEnd - fetchStart`（ミリ秒）
    pub page_load_time: f64,
    /// `domContentLoadedEventEnd - fetchStart`（ミリ秒）
    pub dom_content_loaded: f64,
    /// First Contentful Paint の開始時刻（ミリ秒）
    pub first_contentful_paint: f64,
    /// Largest Contentful Paint（ミリ秒）
    pub largest_contentful_paint: f64,
    /// Time to Interactive（ミリ秒）
    pub time_to_interactive: f64,
    /// 累積レイアウトシフトスコア
    pub cumulative_layout_shift: f64,
    /// リソース名ごとの読み込み時間（ミリ秒）
    pub resource_load_times: HashMap<String, f64>,
    /// エンドポイントごとの応答時間（ミリ秒）
    pub api_response_times: HashMap<String, f64>,
    /// JSヒープ使用量（バイト）
    pub memory_usage: u64,
    /// スクリプトの転送サイズ（バイト）
    pub bundle_size: u64,
    /// 観測時刻
    pub recorded_at: DateTime<Utc>,
}

impl PerformanceSample {
    /// `recorded_at` 時点の空のサンプルを作成
    pub fn new(recorded_at: DateTime<Utc>) -> Self {
        Self {
            page_load_time: 0.0,
            dom_content_loaded: 0.0,
            first_contentful_paint: 0.0,
            largest_contentful_paint: 0.0,
            time_to_interactive: 0.0,
            cumulative_layout_shift: 0.0,
            resource_load_times: HashMap::new(),
            api_response_times: HashMap::new(),
            memory_usage: 0,
            bundle_size: 0,
            recorded_at,
        }
    }

    /// ナビゲーションタイミングを設定
    pub fn with_navigation(mut self, page_load_time: f64, dom_content_loaded: f64) -> Self {
        self.page_load_time = page_load_time;
        self.dom_content_loaded = dom_content_loaded;
        self
    }

    /// FCPを設定
    pub fn with_first_contentful_paint(mut self, fcp: f64) -> Self {
        self.first_contentful_paint = fcp;
        self
    }

    /// CLSを設定
    pub fn with_layout_shift(mut self, cls: f64) -> Self {
        self.cumulative_layout_shift = cls;
        self
    }

    /// メモリ使用量を設定
    pub fn with_memory_usage(mut self, bytes: u64) -> Self {
        self.memory_usage = bytes;
        self
    }

    /// バンドルサイズを設定
    pub fn with_bundle_size(mut self, bytes: u64) -> Self {
        self.bundle_size = bytes;
        self
    }

    /// API応答時間を追加
    pub fn with_api_response_time(mut self, endpoint: impl Into<String>, ms: f64) -> Self {
        self.api_response_times.insert(endpoint.into(), ms);
        self
    }
}

impl Default for PerformanceSample {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

/// 追記専用のサンプル列（古いものは一括で削除）
///
/// 末尾の要素が「現在」のサンプルで、後から届くペイントやレイアウトの
/// 観測はこれを直接更新します。
#[derive(Debug, Default)]
pub struct SampleStore {
    samples: Vec<PerformanceSample>,
}

impl SampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// サンプルを追加し、現在のサンプルにする
    pub fn push(&mut self, sample: PerformanceSample) {
        self.samples.push(sample);
    }

    /// 最新のサンプル
    pub fn current(&self) -> Option<&PerformanceSample> {
        self.samples.last()
    }

    /// 最新のサンプル（可変）
    pub fn current_mut(&mut self) -> Option<&mut PerformanceSample> {
        self.samples.last_mut()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// 保持中サンプルの平均ページ読み込み時間（空なら `0.0`）
    pub fn average_load_time(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().map(|s| s.page_load_time).sum::<f64>() / self.samples.len() as f64
    }

    /// `cutoff` より前のサンプルを削除し、削除件数を返す
    pub fn evict_older_than(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.samples.len();
        self.samples.retain(|s| s.recorded_at >= cutoff);
        before - self.samples.len()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// 保持中の全サンプルのコピー（古い順）
    pub fn snapshot(&self) -> Vec<PerformanceSample> {
        self.samples.clone()
    }
}
