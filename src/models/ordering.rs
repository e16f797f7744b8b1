//! 执行顺序与吸附规则
//!
//! 画布上的纵向位置是用户表达先后顺序的唯一方式：按 y 升序排列，
//! y 相同则保持插入顺序。

use serde::{Deserialize, Serialize};

use crate::models::block::{Action, ActionBlock, BlockId};

/// 按 y 升序排列的块引用（稳定排序）
pub fn order_by_position(blocks: &[ActionBlock]) -> Vec<&ActionBlock> {
    let mut ordered: Vec<&ActionBlock> = blocks.iter().collect();
    ordered.sort_by(|a, b| a.position.y.total_cmp(&b.position.y));
    ordered
}

/// 执行计划中的一步
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedStep {
    /// 从 1 开始的执行序号
    pub sequence: usize,
    pub block_id: BlockId,
    pub action: Action,
}

/// 已定序的执行计划，解释器只看序号，不看坐标
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionPlan {
    pub steps: Vec<PlannedStep>,
}

impl ExecutionPlan {
    pub fn from_blocks(blocks: &[ActionBlock]) -> Self {
        let steps = order_by_position(blocks)
            .into_iter()
            .enumerate()
            .map(|(idx, block)| PlannedStep {
                sequence: idx + 1,
                block_id: block.id,
                action: block.action.clone(),
            })
            .collect();
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// 距离相同时选哪个块
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapTieBreak {
    /// 先插入的块优先
    #[default]
    InsertionOrder,
    /// 下边缘更靠上的块优先
    Uppermost,
}

/// 拖动结束后的吸附规则
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapRule {
    pub threshold: f64,
    pub tie_break: SnapTieBreak,
}

impl Default for SnapRule {
    fn default() -> Self {
        Self {
            threshold: 50.0,
            tie_break: SnapTieBreak::InsertionOrder,
        }
    }
}

impl SnapRule {
    pub fn new(threshold: f64, tie_break: SnapTieBreak) -> Self {
        Self {
            threshold,
            tie_break,
        }
    }

    /// 为被移动的块找到吸附目标，返回它应当落到的新 y 坐标
    ///
    /// 只考虑其他块的下边缘与被移动块上边缘的距离，严格小于阈值才算。
    pub fn snap_target(&self, blocks: &[ActionBlock], moved: BlockId) -> Option<f64> {
        let top = blocks.iter().find(|b| b.id == moved)?.position.y;

        let mut best: Option<(f64, f64)> = None;
        for block in blocks.iter().filter(|b| b.id != moved) {
            let bottom = block.bottom();
            let distance = (top - bottom).abs();
            if distance >= self.threshold {
                continue;
            }
            let better = match best {
                None => true,
                Some((best_distance, best_bottom)) => {
                    distance < best_distance
                        || (distance == best_distance
                            && self.tie_break == SnapTieBreak::Uppermost
                            && bottom < best_bottom)
                }
            };
            if better {
                best = Some((distance, bottom));
            }
        }

        best.map(|(_, bottom)| bottom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::block::{BlockKind, Position};

    fn block(id: u64, kind: BlockKind, y: f64) -> ActionBlock {
        ActionBlock {
            id: BlockId(id),
            position: Position::new(50.0, y),
            action: Action::with_defaults(kind),
        }
    }

    #[test]
    fn test_order_ignores_insertion_order() {
        let blocks = vec![
            block(0, BlockKind::Click, 190.0),
            block(1, BlockKind::LaunchWeb, 50.0),
            block(2, BlockKind::Input, 120.0),
        ];
        let kinds: Vec<BlockKind> = order_by_position(&blocks)
            .iter()
            .map(|b| b.kind())
            .collect();
        assert_eq!(
            kinds,
            vec![BlockKind::LaunchWeb, BlockKind::Input, BlockKind::Click]
        );
    }

    #[test]
    fn test_order_ties_keep_insertion_order() {
        let blocks = vec![
            block(0, BlockKind::Delay, 100.0),
            block(1, BlockKind::Navigate, 100.0),
            block(2, BlockKind::LaunchWeb, 10.0),
        ];
        let ids: Vec<u64> = order_by_position(&blocks).iter().map(|b| b.id.0).collect();
        assert_eq!(ids, vec![2, 0, 1]);
    }

    #[test]
    fn test_plan_sequence_starts_at_one() {
        let blocks = vec![block(7, BlockKind::Delay, 300.0), block(3, BlockKind::Delay, 20.0)];
        let plan = ExecutionPlan::from_blocks(&blocks);
        assert_eq!(plan.steps[0].sequence, 1);
        assert_eq!(plan.steps[0].block_id, BlockId(3));
        assert_eq!(plan.steps[1].sequence, 2);
    }

    #[test]
    fn test_snap_to_nearby_bottom_edge() {
        // LaunchWeb 高 50，下边缘在 100
        let blocks = vec![block(0, BlockKind::LaunchWeb, 50.0), block(1, BlockKind::Click, 130.0)];
        let rule = SnapRule::default();
        assert_eq!(rule.snap_target(&blocks, BlockId(1)), Some(100.0));
    }

    #[test]
    fn test_snap_respects_threshold() {
        let blocks = vec![block(0, BlockKind::LaunchWeb, 50.0), block(1, BlockKind::Click, 150.0)];
        assert_eq!(SnapRule::default().snap_target(&blocks, BlockId(1)), None);
        let wide = SnapRule::new(60.0, SnapTieBreak::InsertionOrder);
        assert_eq!(wide.snap_target(&blocks, BlockId(1)), Some(100.0));
    }

    #[test]
    fn test_snap_is_idempotent() {
        let mut blocks = vec![block(0, BlockKind::LaunchWeb, 50.0), block(1, BlockKind::Click, 110.0)];
        let rule = SnapRule::default();
        let y = rule.snap_target(&blocks, BlockId(1)).unwrap();
        blocks[1].position.y = y;
        assert_eq!(rule.snap_target(&blocks, BlockId(1)), Some(y));
    }

    #[test]
    fn test_snap_never_targets_itself() {
        let blocks = vec![block(0, BlockKind::Delay, 50.0)];
        assert_eq!(SnapRule::default().snap_target(&blocks, BlockId(0)), None);
    }

    #[test]
    fn test_snap_tie_break() {
        // 两个候选的下边缘分别在 100 和 140，被移动块的上边缘在 120，距离都是 20
        let blocks = vec![
            block(0, BlockKind::Navigate, 90.0),
            block(1, BlockKind::Navigate, 50.0),
            block(2, BlockKind::Click, 120.0),
        ];
        let first = SnapRule::new(50.0, SnapTieBreak::InsertionOrder);
        assert_eq!(first.snap_target(&blocks, BlockId(2)), Some(140.0));
        let upper = SnapRule::new(50.0, SnapTieBreak::Uppermost);
        assert_eq!(upper.snap_target(&blocks, BlockId(2)), Some(100.0));
    }
}
