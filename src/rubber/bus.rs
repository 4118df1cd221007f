//! Typed kick event channel
//!
//! A rubber region publishes every kick here; policies such as section
//! navigation subscribe. Single-threaded: listeners live behind
//! `Rc<RefCell<_>>` and run synchronously inside `publish`.

use std::cell::RefCell;
use std::rc::Rc;

/// One kick, as seen by listeners
#[derive(Debug, Clone, PartialEq)]
pub struct KickEvent {
    /// Section whose spring was kicked
    pub section: String,
    /// Raw spring position after the kick
    pub raw: f32,
    /// Host timestamp in milliseconds
    pub at_ms: f64,
}

pub trait KickListener {
    fn on_kick(&mut self, event: &KickEvent);
}

impl<F: FnMut(&KickEvent)> KickListener for F {
    fn on_kick(&mut self, event: &KickEvent) {
        self(event)
    }
}

pub type SharedListener = Rc<RefCell<dyn KickListener>>;

/// Cloneable handle to a listener list
#[derive(Clone, Default)]
pub struct KickBus {
    listeners: Rc<RefCell<Vec<SharedListener>>>,
}

impl KickBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `listener` until the returned subscription is dropped
    pub fn subscribe(&self, listener: SharedListener) -> Subscription {
        self.listeners.borrow_mut().push(Rc::clone(&listener));
        Subscription {
            listener,
            listeners: Rc::clone(&self.listeners),
        }
    }

    /// Call every listener in subscription order.
    ///
    /// Iterates a copy of the list so callbacks may subscribe or drop
    /// subscriptions; a listener dropped mid-publish is skipped, and a
    /// listener already running further up the stack is not re-entered.
    pub fn publish(&self, event: &KickEvent) {
        let listeners = self.listeners.borrow().clone();
        for listener in listeners {
            if !self.is_subscribed(&listener) {
                continue;
            }
            match listener.try_borrow_mut() {
                Ok(mut listener) => listener.on_kick(event),
                Err(_) => log::warn!("Skipping re-entrant kick listener"),
            }
        }
    }

    fn is_subscribed(&self, listener: &SharedListener) -> bool {
        self.listeners
            .borrow()
            .iter()
            .any(|item| Rc::ptr_eq(item, listener))
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl std::fmt::Debug for KickBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KickBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Detaches its listener from the bus on drop
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    listener: SharedListener,
    listeners: Rc<RefCell<Vec<SharedListener>>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut listeners = self.listeners.borrow_mut();
        listeners.retain(|item| !Rc::ptr_eq(item, &self.listener));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(raw: f32) -> KickEvent {
        KickEvent {
            section: "about".into(),
            raw,
            at_ms: 0.0,
        }
    }

    fn recorder() -> (Rc<RefCell<Vec<f32>>>, SharedListener) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let listener: SharedListener =
            Rc::new(RefCell::new(move |e: &KickEvent| sink.borrow_mut().push(e.raw)));
        (seen, listener)
    }

    #[test]
    fn test_publish_reaches_subscribers_in_order() {
        let bus = KickBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let (a, b) = (Rc::clone(&order), Rc::clone(&order));
        let _sa = bus.subscribe(Rc::new(RefCell::new(move |_: &KickEvent| a.borrow_mut().push('a'))));
        let _sb = bus.subscribe(Rc::new(RefCell::new(move |_: &KickEvent| b.borrow_mut().push('b'))));

        bus.publish(&event(1.0));
        assert_eq!(*order.borrow(), vec!['a', 'b']);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus = KickBus::new();
        let (seen, listener) = recorder();
        let sub = bus.subscribe(listener);

        bus.publish(&event(1.0));
        drop(sub);
        bus.publish(&event(2.0));

        assert_eq!(*seen.borrow(), vec![1.0]);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn test_cloned_bus_shares_listeners() {
        let bus = KickBus::new();
        let publisher = bus.clone();
        let (seen, listener) = recorder();
        let _sub = bus.subscribe(listener);
        publisher.publish(&event(5.0));
        assert_eq!(*seen.borrow(), vec![5.0]);
    }

    #[test]
    fn test_listener_may_unsubscribe_another_mid_publish() {
        let bus = KickBus::new();
        let (seen, victim) = recorder();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let killer_slot = Rc::clone(&slot);
        let _killer = bus.subscribe(Rc::new(RefCell::new(move |_: &KickEvent| {
            killer_slot.borrow_mut().take();
        })));
        *slot.borrow_mut() = Some(bus.subscribe(victim));

        bus.publish(&event(1.0));
        assert!(seen.borrow().is_empty());
        assert_eq!(bus.listener_count(), 1);
    }

    #[test]
    fn test_listener_may_subscribe_mid_publish() {
        let bus = KickBus::new();
        let inner_bus = bus.clone();
        let held: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));
        let hold = Rc::clone(&held);

        let _sub = bus.subscribe(Rc::new(RefCell::new(move |_: &KickEvent| {
            let (_, listener) = recorder();
            hold.borrow_mut().push(inner_bus.subscribe(listener));
        })));

        bus.publish(&event(1.0));
        assert_eq!(bus.listener_count(), 2);
    }
}
