//! Transition table for a single remote resource.
//!
//! The machine is pure: it tracks identity, phase and the current fetch
//! generation, and answers every [`Event`] with the list of [`Effect`]s the
//! owner must perform, in order. Timers, tasks and data live with the owner.

use super::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Idle,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event<I> {
    IdentityChanged(Option<I>),
    Refetch,
    Succeeded { generation: u64 },
    Failed { generation: u64 },
    TearDown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Effect<I> {
    CancelTimer,
    CancelInFlight,
    ClearData,
    StartFetch { generation: u64, identity: I },
    StoreData,
    StoreFailure,
    ArmRetry,
    Publish,
    /// A settlement arrived for a generation that is no longer current.
    Discard { generation: u64 },
}

#[derive(Debug)]
pub(crate) struct Machine<I> {
    identity: Option<I>,
    phase: Phase,
    generation: u64,
    policy: RetryPolicy,
    torn_down: bool,
}

impl<I: Clone + PartialEq> Machine<I> {
    pub(crate) fn new(policy: RetryPolicy) -> Self {
        Self {
            identity: None,
            phase: Phase::Idle,
            generation: 0,
            policy,
            torn_down: false,
        }
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn identity(&self) -> Option<&I> {
        self.identity.as_ref()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn transition(&mut self, event: Event<I>) -> Vec<Effect<I>> {
        if self.torn_down {
            return match event {
                Event::Succeeded { generation } | Event::Failed { generation } => {
                    vec![Effect::Discard { generation }]
                }
                _ => Vec::new(),
            };
        }

        match event {
            Event::TearDown => {
                self.torn_down = true;
                self.generation += 1;
                self.phase = Phase::Idle;
                vec![Effect::CancelTimer, Effect::CancelInFlight]
            }
            Event::IdentityChanged(next) => {
                if next == self.identity {
                    return Vec::new();
                }
                self.identity = next;
                self.generation += 1;
                let mut effects = vec![
                    Effect::CancelTimer,
                    Effect::CancelInFlight,
                    Effect::ClearData,
                ];
                match &self.identity {
                    Some(identity) => {
                        self.phase = Phase::Loading;
                        effects.push(Effect::StartFetch {
                            generation: self.generation,
                            identity: identity.clone(),
                        });
                    }
                    None => self.phase = Phase::Idle,
                }
                effects.push(Effect::Publish);
                effects
            }
            Event::Refetch => {
                let Some(identity) = self.identity.clone() else {
                    return Vec::new();
                };
                if self.phase == Phase::Loading {
                    return Vec::new();
                }
                self.generation += 1;
                self.phase = Phase::Loading;
                vec![
                    Effect::StartFetch {
                        generation: self.generation,
                        identity,
                    },
                    Effect::Publish,
                ]
            }
            Event::Succeeded { generation } => {
                if !self.is_current(generation) {
                    return vec![Effect::Discard { generation }];
                }
                self.phase = Phase::Ready;
                vec![Effect::StoreData, Effect::CancelTimer, Effect::Publish]
            }
            Event::Failed { generation } => {
                if !self.is_current(generation) {
                    return vec![Effect::Discard { generation }];
                }
                self.phase = Phase::Failed;
                let mut effects = vec![Effect::StoreFailure, Effect::Publish];
                if self.policy == RetryPolicy::SelfManaged {
                    effects.push(Effect::ArmRetry);
                }
                effects
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.generation && self.phase == Phase::Loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loading(policy: RetryPolicy, identity: u32) -> (Machine<u32>, u64) {
        let mut machine = Machine::new(policy);
        machine.transition(Event::IdentityChanged(Some(identity)));
        let generation = machine.generation();
        (machine, generation)
    }

    #[test]
    fn new_identity_starts_fetch_after_cancelling_previous_work() {
        let mut machine = Machine::<u32>::new(RetryPolicy::SelfManaged);
        let effects = machine.transition(Event::IdentityChanged(Some(7)));
        assert_eq!(
            effects,
            vec![
                Effect::CancelTimer,
                Effect::CancelInFlight,
                Effect::ClearData,
                Effect::StartFetch {
                    generation: 1,
                    identity: 7
                },
                Effect::Publish,
            ]
        );
        assert_eq!(machine.phase(), Phase::Loading);
    }

    #[test]
    fn null_identity_stays_idle_without_fetching() {
        let mut machine = Machine::<u32>::new(RetryPolicy::SelfManaged);
        assert!(machine.transition(Event::IdentityChanged(None)).is_empty());
        assert!(machine.transition(Event::Refetch).is_empty());
        assert_eq!(machine.phase(), Phase::Idle);
    }

    #[test]
    fn clearing_identity_returns_to_idle() {
        let (mut machine, _) = loading(RetryPolicy::SelfManaged, 1);
        let effects = machine.transition(Event::IdentityChanged(None));
        assert!(!effects
            .iter()
            .any(|e| matches!(e, Effect::StartFetch { .. })));
        assert!(effects.contains(&Effect::CancelTimer));
        assert_eq!(machine.phase(), Phase::Idle);
        assert_eq!(machine.identity(), None);
    }

    #[test]
    fn same_identity_is_not_a_change() {
        let (mut machine, generation) = loading(RetryPolicy::SelfManaged, 1);
        assert!(machine
            .transition(Event::IdentityChanged(Some(1)))
            .is_empty());
        assert_eq!(machine.generation(), generation);
    }

    #[test]
    fn result_from_previous_identity_is_discarded() {
        let (mut machine, old) = loading(RetryPolicy::SelfManaged, 1);
        machine.transition(Event::IdentityChanged(Some(2)));
        let effects = machine.transition(Event::Succeeded { generation: old });
        assert_eq!(effects, vec![Effect::Discard { generation: old }]);
        assert_eq!(machine.phase(), Phase::Loading);

        let effects = machine.transition(Event::Failed { generation: old });
        assert_eq!(effects, vec![Effect::Discard { generation: old }]);
        assert_eq!(machine.phase(), Phase::Loading);
    }

    #[test]
    fn refetch_while_loading_is_a_no_op() {
        let (mut machine, generation) = loading(RetryPolicy::SelfManaged, 1);
        assert!(machine.transition(Event::Refetch).is_empty());
        assert_eq!(machine.generation(), generation);
    }

    #[test]
    fn success_cancels_retry_timer() {
        let (mut machine, generation) = loading(RetryPolicy::SelfManaged, 1);
        let effects = machine.transition(Event::Succeeded { generation });
        assert_eq!(
            effects,
            vec![Effect::StoreData, Effect::CancelTimer, Effect::Publish]
        );
        assert_eq!(machine.phase(), Phase::Ready);
    }

    #[test]
    fn failure_arms_retry_only_for_self_managed_policy() {
        let (mut machine, generation) = loading(RetryPolicy::SelfManaged, 1);
        assert!(machine
            .transition(Event::Failed { generation })
            .contains(&Effect::ArmRetry));

        for policy in [RetryPolicy::CallerDriven, RetryPolicy::SingleAttempt] {
            let (mut machine, generation) = loading(policy, 1);
            let effects = machine.transition(Event::Failed { generation });
            assert!(!effects.contains(&Effect::ArmRetry), "{policy:?}");
            assert_eq!(machine.phase(), Phase::Failed);
        }
    }

    #[test]
    fn refetch_after_failure_moves_to_a_new_generation() {
        let (mut machine, first) = loading(RetryPolicy::SelfManaged, 1);
        machine.transition(Event::Failed { generation: first });
        let effects = machine.transition(Event::Refetch);
        assert_eq!(
            effects,
            vec![
                Effect::StartFetch {
                    generation: first + 1,
                    identity: 1
                },
                Effect::Publish
            ]
        );
        // The failed attempt cannot settle twice.
        assert_eq!(
            machine.transition(Event::Succeeded { generation: first }),
            vec![Effect::Discard { generation: first }]
        );
    }

    #[test]
    fn teardown_cancels_everything_and_ignores_later_events() {
        let (mut machine, generation) = loading(RetryPolicy::SelfManaged, 1);
        assert_eq!(
            machine.transition(Event::TearDown),
            vec![Effect::CancelTimer, Effect::CancelInFlight]
        );
        assert_eq!(
            machine.transition(Event::Succeeded { generation }),
            vec![Effect::Discard { generation }]
        );
        assert!(machine.transition(Event::Refetch).is_empty());
        assert!(machine
            .transition(Event::IdentityChanged(Some(9)))
            .is_empty());
        assert!(machine.transition(Event::TearDown).is_empty());
    }
}
