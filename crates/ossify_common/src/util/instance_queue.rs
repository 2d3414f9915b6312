use id_collections::{Count, Id};
use std::collections::{BTreeMap, VecDeque};

/// Assigns a stable output id to each distinct instantiation request and
/// queues unseen requests for emission. Ids are minted in request order, so
/// a driver that pushes emitted definitions in pop order can index them by
/// id directly.
#[derive(Clone, Debug)]
pub struct InstanceQueue<Inst, MonoId: Id> {
    count: Count<MonoId>,
    resolved: BTreeMap<Inst, MonoId>,
    pending: VecDeque<(MonoId, Inst)>,
}

impl<Inst: Ord + Clone, MonoId: Id> InstanceQueue<Inst, MonoId> {
    pub fn new() -> Self {
        InstanceQueue {
            count: Count::new(),
            resolved: BTreeMap::new(),
            pending: VecDeque::new(),
        }
    }

    /// Idempotent: equal instances always resolve to the same id.
    pub fn resolve(&mut self, inst: Inst) -> MonoId {
        if let Some(&existing) = self.resolved.get(&inst) {
            return existing;
        }
        let new_id = self.count.inc();
        self.resolved.insert(inst.clone(), new_id);
        self.pending.push_back((new_id, inst));
        new_id
    }

    pub fn lookup(&self, inst: &Inst) -> Option<MonoId> {
        self.resolved.get(inst).copied()
    }

    pub fn pop_pending(&mut self) -> Option<(MonoId, Inst)> {
        self.pending.pop_front()
    }

    pub fn num_resolved(&self) -> usize {
        self.resolved.len()
    }
}

impl<Inst: Ord + Clone, MonoId: Id> Default for InstanceQueue<Inst, MonoId> {
    fn default() -> Self {
        InstanceQueue::new()
    }
}
