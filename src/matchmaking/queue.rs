use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{GameError, GameResult};

/// 대기열 한 칸
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub connection_id: Uuid,
    pub joined_at: DateTime<Utc>,
}

/// 대기열 등록 결과
#[derive(Debug, Clone, PartialEq)]
pub enum EnqueueOutcome {
    /// 상대를 기다리는 중
    Waiting,
    /// 가장 오래 기다린 두 연결이 짝지어짐 (first = left, second = right)
    Paired { first: QueueEntry, second: QueueEntry },
}

/// FIFO Match Queue. 실력 매칭 없이 먼저 온 순서대로 두 명씩 묶는다.
#[derive(Debug, Default)]
pub struct MatchQueue {
    waiting: VecDeque<QueueEntry>,
}

impl MatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }

    pub fn contains(&self, connection_id: Uuid) -> bool {
        self.waiting.iter().any(|e| e.connection_id == connection_id)
    }

    /// 대기열 끝에 추가하고, 두 명 이상이면 가장 오래된 둘을 꺼낸다.
    ///
    /// 세션 소속 여부(AlreadyInGame)는 호출자가 먼저 확인한다.
    pub fn enqueue(&mut self, connection_id: Uuid) -> GameResult<EnqueueOutcome> {
        if self.contains(connection_id) {
            warn!("Connection {} is already waiting. Ignoring duplicate enqueue.", connection_id);
            return Err(GameError::AlreadyInQueue { connection_id });
        }

        self.waiting.push_back(QueueEntry {
            connection_id,
            joined_at: Utc::now(),
        });
        debug!("Connection {} queued (queue size: {})", connection_id, self.len());

        if self.waiting.len() < 2 {
            return Ok(EnqueueOutcome::Waiting);
        }

        match (self.waiting.pop_front(), self.waiting.pop_front()) {
            (Some(first), Some(second)) => Ok(EnqueueOutcome::Paired { first, second }),
            _ => Err(GameError::Internal(
                "queue length changed while pairing".to_string(),
            )),
        }
    }

    /// 멱등. 제거된 경우 true.
    pub fn remove(&mut self, connection_id: Uuid) -> bool {
        let before = self.waiting.len();
        self.waiting.retain(|e| e.connection_id != connection_id);
        before != self.waiting.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    #[test]
    fn first_connection_waits() {
        let mut queue = MatchQueue::new();
        assert_eq!(queue.enqueue(id(1)).unwrap(), EnqueueOutcome::Waiting);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn second_connection_pairs_oldest_first() {
        let mut queue = MatchQueue::new();
        queue.enqueue(id(1)).unwrap();
        match queue.enqueue(id(2)).unwrap() {
            EnqueueOutcome::Paired { first, second } => {
                assert_eq!(first.connection_id, id(1));
                assert_eq!(second.connection_id, id(2));
                assert!(first.joined_at <= second.joined_at);
            }
            other => panic!("expected pairing, got {:?}", other),
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn duplicate_enqueue_is_rejected() {
        let mut queue = MatchQueue::new();
        queue.enqueue(id(1)).unwrap();
        assert_eq!(
            queue.enqueue(id(1)).unwrap_err(),
            GameError::AlreadyInQueue { connection_id: id(1) }
        );
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut queue = MatchQueue::new();
        queue.enqueue(id(1)).unwrap();
        assert!(queue.remove(id(1)));
        assert!(!queue.remove(id(1)));
        assert!(!queue.remove(id(42)));
        assert!(queue.is_empty());
    }

    #[test]
    fn departed_connection_never_pairs() {
        let mut queue = MatchQueue::new();
        queue.enqueue(id(1)).unwrap();
        queue.remove(id(1));
        assert_eq!(queue.enqueue(id(2)).unwrap(), EnqueueOutcome::Waiting);
        match queue.enqueue(id(3)).unwrap() {
            EnqueueOutcome::Paired { first, second } => {
                assert_eq!((first.connection_id, second.connection_id), (id(2), id(3)));
            }
            other => panic!("expected pairing, got {:?}", other),
        }
    }
}
