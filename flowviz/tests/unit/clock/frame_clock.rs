use std::rc::Rc;

use super::*;

#[test]
fn manual_clock_runs_only_callbacks_queued_before_fire() {
    let clock = Rc::new(ManualFrameClock::new());
    let log = Rc::new(RefCell::new(Vec::new()));

    let (c, l) = (Rc::clone(&clock), Rc::clone(&log));
    clock.schedule_next(Box::new(move || {
        l.borrow_mut().push("first");
        let l2 = Rc::clone(&l);
        c.schedule_next(Box::new(move || l2.borrow_mut().push("second")));
    }));

    assert_eq!(clock.fire(), 1);
    assert_eq!(*log.borrow(), vec!["first"]);
    assert_eq!(clock.pending(), 1);
    assert_eq!(clock.fire(), 1);
    assert_eq!(*log.borrow(), vec!["first", "second"]);
    assert_eq!(clock.fire(), 0);
}

#[test]
fn cancelled_token_never_runs() {
    let clock = ManualFrameClock::new();
    let hits = Rc::new(Cell::new(0));
    let h = Rc::clone(&hits);
    let token = clock.schedule_next(Box::new(move || h.set(h.get() + 1)));
    clock.cancel(token);
    clock.cancel(token);
    assert_eq!(clock.fire(), 0);
    assert_eq!(hits.get(), 0);
}

#[test]
fn manual_time_advances() {
    let clock = ManualFrameClock::new();
    clock.set_time(10.0);
    clock.advance(5.5);
    assert_eq!(clock.now_ms(), 15.5);
    clock.step(4.5);
    assert_eq!(clock.now_ms(), 20.0);
}

#[test]
fn refresh_clock_runs_until_idle() {
    let clock = Rc::new(RefreshClock::new(1000));
    let remaining = Rc::new(Cell::new(3u32));

    fn reschedule(clock: Rc<RefreshClock>, remaining: Rc<Cell<u32>>) {
        let c = Rc::clone(&clock);
        clock.schedule_next(Box::new(move || {
            remaining.set(remaining.get() - 1);
            if remaining.get() > 0 {
                reschedule(c, remaining);
            }
        }));
    }
    reschedule(Rc::clone(&clock), Rc::clone(&remaining));

    let before = clock.now_ms();
    assert_eq!(clock.run_until_idle(), 3);
    assert_eq!(remaining.get(), 0);
    assert!(clock.now_ms() >= before);
}

#[test]
fn refresh_interval_follows_rate_and_clamps_zero() {
    assert_eq!(RefreshClock::new(4).interval(), Duration::from_millis(250));
    assert_eq!(RefreshClock::new(0).interval(), Duration::from_secs(1));
}
