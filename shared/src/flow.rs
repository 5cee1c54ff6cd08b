//! 订单流程定义 - 按业务变体参数化的阶段表
//!
//! 同一个引擎服务两种业态，阶段表由配置选择：
//!
//! | 变体 | 阶段 |
//! |------|------|
//! | restaurant | cart(0) → kitchen(1) → preparing(2) → ready(3) → served(4) → billed(5) → completed(6) |
//! | billing | pending(0) → checked_out(1) → completed(2) |
//!
//! 阶段以整数码存库，名称只在 API 边界出现。转换表是数据，
//! 不是散落在各 handler 里的 if 链。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Restaurant-variant stage codes
pub mod restaurant {
    pub const CART: i64 = 0;
    pub const KITCHEN: i64 = 1;
    pub const PREPARING: i64 = 2;
    pub const READY: i64 = 3;
    pub const SERVED: i64 = 4;
    pub const BILLED: i64 = 5;
    pub const COMPLETED: i64 = 6;
}

/// Billing-variant stage codes
pub mod billing {
    pub const PENDING: i64 = 0;
    pub const CHECKED_OUT: i64 = 1;
    pub const COMPLETED: i64 = 2;
}

/// One stage of a flow: numeric code (stored) + wire name (API)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub code: i64,
    pub name: &'static str,
}

const RESTAURANT_STAGES: &[Stage] = &[
    Stage { code: restaurant::CART, name: "cart" },
    Stage { code: restaurant::KITCHEN, name: "kitchen" },
    Stage { code: restaurant::PREPARING, name: "preparing" },
    Stage { code: restaurant::READY, name: "ready" },
    Stage { code: restaurant::SERVED, name: "served" },
    Stage { code: restaurant::BILLED, name: "billed" },
    Stage { code: restaurant::COMPLETED, name: "completed" },
];

const BILLING_STAGES: &[Stage] = &[
    Stage { code: billing::PENDING, name: "pending" },
    Stage { code: billing::CHECKED_OUT, name: "checked_out" },
    Stage { code: billing::COMPLETED, name: "completed" },
];

/// Allowed (from, to) pairs, restaurant variant.
///
/// mark-served accepts kitchen/preparing/ready so a rushed floor can skip
/// the chef progression without lying about history.
const RESTAURANT_TRANSITIONS: &[(i64, i64)] = &[
    (restaurant::CART, restaurant::KITCHEN),
    (restaurant::KITCHEN, restaurant::PREPARING),
    (restaurant::PREPARING, restaurant::READY),
    (restaurant::KITCHEN, restaurant::SERVED),
    (restaurant::PREPARING, restaurant::SERVED),
    (restaurant::READY, restaurant::SERVED),
    (restaurant::SERVED, restaurant::BILLED),
    (restaurant::BILLED, restaurant::COMPLETED),
];

const BILLING_TRANSITIONS: &[(i64, i64)] = &[
    (billing::PENDING, billing::CHECKED_OUT),
    (billing::CHECKED_OUT, billing::COMPLETED),
];

/// 业务变体 - 通过 `POS_FLOW` 配置选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowVariant {
    Restaurant,
    Billing,
}

impl FlowVariant {
    /// All stages of this variant, in pipeline order
    pub fn stages(self) -> &'static [Stage] {
        match self {
            FlowVariant::Restaurant => RESTAURANT_STAGES,
            FlowVariant::Billing => BILLING_STAGES,
        }
    }

    /// Stage a freshly added line starts in (cart / pending)
    pub fn initial(self) -> i64 {
        0
    }

    /// Stage a line must be in before send-to-bill / checkout picks it up
    pub fn bill_source(self) -> i64 {
        match self {
            FlowVariant::Restaurant => restaurant::SERVED,
            FlowVariant::Billing => billing::PENDING,
        }
    }

    /// The billed boundary. Lines strictly below still belong to the open
    /// order for (table, server); at or above, a new visit opens a new order.
    pub fn billed(self) -> i64 {
        match self {
            FlowVariant::Restaurant => restaurant::BILLED,
            FlowVariant::Billing => billing::CHECKED_OUT,
        }
    }

    /// Terminal stage
    pub fn completed(self) -> i64 {
        match self {
            FlowVariant::Restaurant => restaurant::COMPLETED,
            FlowVariant::Billing => billing::COMPLETED,
        }
    }

    /// Kitchen display stages (empty in the billing variant)
    pub fn kitchen_stages(self) -> &'static [i64] {
        match self {
            FlowVariant::Restaurant => {
                &[restaurant::KITCHEN, restaurant::PREPARING, restaurant::READY]
            }
            FlowVariant::Billing => &[],
        }
    }

    pub fn has_kitchen(self) -> bool {
        !self.kitchen_stages().is_empty()
    }

    pub fn is_valid_stage(self, code: i64) -> bool {
        self.stages().iter().any(|s| s.code == code)
    }

    /// Wire name for a stage code
    pub fn stage_name(self, code: i64) -> Option<&'static str> {
        self.stages().iter().find(|s| s.code == code).map(|s| s.name)
    }

    /// Parse a stage from its wire name or numeric string
    pub fn parse_stage(self, s: &str) -> Option<i64> {
        if let Some(stage) = self.stages().iter().find(|st| st.name == s) {
            return Some(stage.code);
        }
        s.parse::<i64>().ok().filter(|c| self.is_valid_stage(*c))
    }

    /// Transition table lookup. Merge (cart → cart quantity bump) is not a
    /// stage change and is intentionally absent here.
    pub fn is_transition_allowed(self, from: i64, to: i64) -> bool {
        let table = match self {
            FlowVariant::Restaurant => RESTAURANT_TRANSITIONS,
            FlowVariant::Billing => BILLING_TRANSITIONS,
        };
        table.contains(&(from, to))
    }

    /// Stages a single mark-served style transition may come from
    pub fn sources_for(self, to: i64) -> Vec<i64> {
        let table = match self {
            FlowVariant::Restaurant => RESTAURANT_TRANSITIONS,
            FlowVariant::Billing => BILLING_TRANSITIONS,
        };
        table
            .iter()
            .filter(|(_, t)| *t == to)
            .map(|(f, _)| *f)
            .collect()
    }
}

impl fmt::Display for FlowVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowVariant::Restaurant => write!(f, "restaurant"),
            FlowVariant::Billing => write!(f, "billing"),
        }
    }
}

impl FromStr for FlowVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "restaurant" => Ok(FlowVariant::Restaurant),
            "billing" => Ok(FlowVariant::Billing),
            other => Err(format!("unknown flow variant: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restaurant_pipeline_is_ordered() {
        let v = FlowVariant::Restaurant;
        assert_eq!(v.initial(), restaurant::CART);
        assert_eq!(v.bill_source(), restaurant::SERVED);
        assert_eq!(v.billed(), restaurant::BILLED);
        assert_eq!(v.completed(), restaurant::COMPLETED);
        assert!(v.has_kitchen());
    }

    #[test]
    fn billing_pipeline_is_reduced() {
        let v = FlowVariant::Billing;
        assert_eq!(v.stages().len(), 3);
        assert_eq!(v.bill_source(), billing::PENDING);
        assert_eq!(v.billed(), billing::CHECKED_OUT);
        assert_eq!(v.completed(), billing::COMPLETED);
        assert!(!v.has_kitchen());
        assert!(v.kitchen_stages().is_empty());
    }

    #[test]
    fn transition_table_restaurant() {
        let v = FlowVariant::Restaurant;
        assert!(v.is_transition_allowed(restaurant::CART, restaurant::KITCHEN));
        assert!(v.is_transition_allowed(restaurant::KITCHEN, restaurant::PREPARING));
        assert!(v.is_transition_allowed(restaurant::PREPARING, restaurant::READY));
        assert!(v.is_transition_allowed(restaurant::READY, restaurant::SERVED));
        assert!(v.is_transition_allowed(restaurant::SERVED, restaurant::BILLED));
        assert!(v.is_transition_allowed(restaurant::BILLED, restaurant::COMPLETED));
        // 不允许跳段或回退
        assert!(!v.is_transition_allowed(restaurant::CART, restaurant::SERVED));
        assert!(!v.is_transition_allowed(restaurant::SERVED, restaurant::CART));
        assert!(!v.is_transition_allowed(restaurant::CART, restaurant::COMPLETED));
    }

    #[test]
    fn transition_table_billing() {
        let v = FlowVariant::Billing;
        assert!(v.is_transition_allowed(billing::PENDING, billing::CHECKED_OUT));
        assert!(v.is_transition_allowed(billing::CHECKED_OUT, billing::COMPLETED));
        assert!(!v.is_transition_allowed(billing::PENDING, billing::COMPLETED));
    }

    #[test]
    fn served_reachable_from_all_kitchen_stages() {
        let v = FlowVariant::Restaurant;
        let mut sources = v.sources_for(restaurant::SERVED);
        sources.sort();
        assert_eq!(
            sources,
            vec![restaurant::KITCHEN, restaurant::PREPARING, restaurant::READY]
        );
    }

    #[test]
    fn stage_names_round_trip() {
        let v = FlowVariant::Restaurant;
        for stage in v.stages() {
            assert_eq!(v.parse_stage(stage.name), Some(stage.code));
            assert_eq!(v.stage_name(stage.code), Some(stage.name));
        }
        // numeric strings parse too
        assert_eq!(v.parse_stage("4"), Some(restaurant::SERVED));
        assert_eq!(v.parse_stage("99"), None);
        assert_eq!(v.parse_stage("nonsense"), None);
    }

    #[test]
    fn variant_parses_from_config_string() {
        assert_eq!("restaurant".parse::<FlowVariant>(), Ok(FlowVariant::Restaurant));
        assert_eq!(" Billing ".parse::<FlowVariant>(), Ok(FlowVariant::Billing));
        assert!("retail".parse::<FlowVariant>().is_err());
    }

    #[test]
    fn variant_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&FlowVariant::Restaurant).unwrap(),
            r#""restaurant""#
        );
        assert_eq!(
            serde_json::from_str::<FlowVariant>(r#""billing""#).unwrap(),
            FlowVariant::Billing
        );
    }
}
