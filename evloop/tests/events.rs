mod common;

use common::{Counter, Record, manual_reactor};
use evloop::EventId;
use evloop::clock::Clock;
use std::time::Duration;

#[test]
fn trigger_is_not_synchronous() {
    let (mut reactor, _clock) = manual_reactor::<u32>();
    let received = Record::new();

    let id = reactor
        .add_event({
            let received = received.clone();
            move |_, data| received.push(data)
        })
        .unwrap();

    // Registered events alone are not pending work.
    assert!(reactor.is_idle());

    assert!(reactor.trigger_event(id, 7).unwrap());
    assert!(!reactor.is_idle());
    assert_eq!(received.len(), 0);

    assert!(reactor.step().unwrap());
    assert_eq!(received.take(), vec![7]);

    assert!(reactor.is_idle());
    assert!(!reactor.step().unwrap());
}

#[test]
fn callback_receives_captured_userdata_and_eventdata() {
    let (mut reactor, _clock) = manual_reactor::<String>();
    let received = Record::new();

    let userdata = String::from("sensor-3");
    let id = reactor
        .add_event({
            let received = received.clone();
            move |_, eventdata: String| received.push((userdata.clone(), eventdata))
        })
        .unwrap();

    reactor.trigger_event(id, "overheat".to_owned()).unwrap();
    reactor.trigger_event(id, "recovered".to_owned()).unwrap();
    reactor.run().unwrap();

    assert_eq!(
        received.take(),
        vec![
            ("sensor-3".to_owned(), "overheat".to_owned()),
            ("sensor-3".to_owned(), "recovered".to_owned()),
        ]
    );
}

#[test]
fn removing_event_drops_pending_triggers() {
    let (mut reactor, _clock) = manual_reactor::<()>();
    let calls = Counter::new();

    let id = reactor
        .add_event({
            let calls = calls.clone();
            move |_, ()| calls.hit()
        })
        .unwrap();

    reactor.trigger_event(id, ()).unwrap();
    reactor.trigger_event(id, ()).unwrap();
    assert!(reactor.remove_event(id));
    assert!(!reactor.has_event(id));

    // The stale triggers are still consumed, one per step.
    assert_eq!(reactor.pending_timers(), 2);
    assert!(reactor.step().unwrap());
    assert!(reactor.step().unwrap());
    assert!(!reactor.step().unwrap());

    assert_eq!(calls.get(), 0);
}

#[test]
fn unknown_ids_are_ignored() {
    let (mut reactor, _clock) = manual_reactor::<()>();

    let id = reactor.add_event(|_, ()| {}).unwrap();
    assert!(reactor.remove_event(id));
    assert!(!reactor.remove_event(id));

    assert!(!reactor.trigger_event(id, ()).unwrap());
    assert!(!reactor.trigger_event(EventId::from_raw(999), ()).unwrap());
    assert_eq!(reactor.pending_timers(), 0);
    assert!(!reactor.step().unwrap());
}

#[test]
fn triggers_dispatch_in_trigger_order() {
    let (mut reactor, _clock) = manual_reactor::<char>();
    let order = Record::new();

    let first = reactor
        .add_event({
            let order = order.clone();
            move |_, data| order.push(('1', data))
        })
        .unwrap();
    let second = reactor
        .add_event({
            let order = order.clone();
            move |_, data| order.push(('2', data))
        })
        .unwrap();

    reactor.trigger_event(second, 'a').unwrap();
    reactor.trigger_event(first, 'b').unwrap();
    reactor.trigger_event(second, 'c').unwrap();
    reactor.run().unwrap();

    assert_eq!(order.take(), vec![('2', 'a'), ('1', 'b'), ('2', 'c')]);
}

#[test]
fn triggers_interleave_with_timers_by_deadline() {
    let (mut reactor, clock) = manual_reactor::<&'static str>();
    let order = Record::new();

    let event = reactor
        .add_event({
            let order = order.clone();
            move |_, data| order.push(data)
        })
        .unwrap();
    reactor
        .add_timer(Duration::from_micros(100), {
            let order = order.clone();
            move |_| order.push("due timer")
        })
        .unwrap();
    reactor
        .add_timer(Duration::from_micros(500), {
            let order = order.clone();
            move |_| order.push("future timer")
        })
        .unwrap();

    clock.advance(200);
    reactor.trigger_event(event, "trigger").unwrap();

    reactor.run().unwrap();

    assert_eq!(order.take(), vec!["due timer", "trigger", "future timer"]);
    assert_eq!(clock.now_us(), 500);
}

#[test]
fn event_dispatch_does_not_sleep() {
    let (mut reactor, clock) = manual_reactor::<()>();
    let calls = Counter::new();

    let id = reactor
        .add_event({
            let calls = calls.clone();
            move |_, ()| calls.hit()
        })
        .unwrap();
    reactor.add_timer(Duration::from_micros(1000), |_| {}).unwrap();

    reactor.trigger_event(id, ()).unwrap();
    assert!(reactor.step().unwrap());

    assert_eq!(calls.get(), 1);
    assert_eq!(clock.now_us(), 0);
}

#[test]
fn callbacks_can_retrigger_and_remove_events() {
    let (mut reactor, _clock) = manual_reactor::<u32>();
    let seen = Record::new();

    let self_id = std::rc::Rc::new(std::cell::Cell::new(None::<EventId>));
    let id = reactor
        .add_event({
            let seen = seen.clone();
            let self_id = self_id.clone();
            move |reactor, n| {
                seen.push(n);
                let id = self_id.get().expect("id recorded before triggering");
                if n < 3 {
                    assert!(reactor.trigger_event(id, n + 1).unwrap());
                } else {
                    assert!(reactor.remove_event(id));
                }
            }
        })
        .unwrap();
    self_id.set(Some(id));

    reactor.trigger_event(id, 1).unwrap();
    reactor.run().unwrap();

    assert_eq!(seen.take(), vec![1, 2, 3]);
    assert!(!reactor.has_event(id));
    assert_eq!(reactor.event_count(), 0);
}

#[test]
fn removing_one_event_keeps_the_others_dispatchable() {
    let (mut reactor, _clock) = manual_reactor::<()>();
    let hits = Record::new();

    let ids: Vec<EventId> = (0..4)
        .map(|n| {
            let hits = hits.clone();
            reactor.add_event(move |_, ()| hits.push(n)).unwrap()
        })
        .collect();

    assert!(reactor.remove_event(ids[1]));
    assert_eq!(reactor.event_count(), 3);

    for &id in &ids {
        reactor.trigger_event(id, ()).unwrap();
    }
    reactor.run().unwrap();

    assert_eq!(hits.take(), vec![0, 2, 3]);
}

#[test]
fn trigger_queued_before_nested_step_is_delivered_later() {
    let (mut reactor, _clock) = manual_reactor::<u32>();
    let seen = Record::new();

    let self_id = std::rc::Rc::new(std::cell::Cell::new(None::<EventId>));
    let id = reactor
        .add_event({
            let seen = seen.clone();
            let self_id = self_id.clone();
            move |reactor, n| {
                seen.push(n);
                if n == 1 {
                    let id = self_id.get().expect("id recorded before triggering");
                    assert!(reactor.trigger_event(id, 2).unwrap());
                    // The nested step reaches the trigger while this callback
                    // is still running.
                    assert!(reactor.step().unwrap());
                }
            }
        })
        .unwrap();
    self_id.set(Some(id));

    reactor.trigger_event(id, 1).unwrap();
    reactor.run().unwrap();

    assert_eq!(seen.take(), vec![1, 2]);
    assert!(reactor.has_event(id));
}

#[test]
fn nested_run_inside_event_callback_terminates() {
    let (mut reactor, _clock) = manual_reactor::<u32>();
    let seen = Record::new();

    let self_id = std::rc::Rc::new(std::cell::Cell::new(None::<EventId>));
    let id = reactor
        .add_event({
            let seen = seen.clone();
            let self_id = self_id.clone();
            move |reactor, n| {
                seen.push(n);
                if n == 1 {
                    let id = self_id.get().expect("id recorded before triggering");
                    reactor.trigger_event(id, 2).unwrap();
                    reactor.trigger_event(id, 3).unwrap();
                    reactor.run().unwrap();
                }
            }
        })
        .unwrap();
    self_id.set(Some(id));

    reactor.trigger_event(id, 1).unwrap();
    reactor.run().unwrap();

    assert_eq!(seen.take(), vec![1, 2, 3]);
    assert!(reactor.is_idle());
}

#[test]
fn triggers_held_for_a_running_event_are_dropped_if_it_is_removed() {
    let (mut reactor, _clock) = manual_reactor::<u32>();
    let seen = Record::new();

    let self_id = std::rc::Rc::new(std::cell::Cell::new(None::<EventId>));
    let id = reactor
        .add_event({
            let seen = seen.clone();
            let self_id = self_id.clone();
            move |reactor, n| {
                seen.push(n);
                let id = self_id.get().expect("id recorded before triggering");
                reactor.trigger_event(id, n + 1).unwrap();
                assert!(reactor.step().unwrap());
                assert!(reactor.remove_event(id));
            }
        })
        .unwrap();
    self_id.set(Some(id));

    reactor.trigger_event(id, 1).unwrap();
    reactor.run().unwrap();

    assert_eq!(seen.take(), vec![1]);
    assert!(reactor.is_idle());
}
