//! Shared key/value store usage from a plugin: seed on VM start, then an
//! optimistic read-modify-write loop on every request.

mod common;

use common::MockHost;
use proxy_shim::dispatch::{HttpEvent, RootEvent};
use proxy_shim::prelude::*;
use proxy_shim::state::with_state;

const SHARED_KEY: &str = "shared_data_key";

struct CounterRoot;

impl RootContext for CounterRoot {
    fn on_vm_start(&mut self, _vm_configuration_size: usize) -> bool {
        if let Err(e) = hostcall::set_shared_data(SHARED_KEY, &[0], 0) {
            let _ = hostcall::log_warn(&format!("error setting shared data on vm start: {e}"));
        }
        true
    }

    fn create_http_context(&self, _context_id: u32) -> Option<Box<dyn HttpContext>> {
        Some(Box::new(CounterHttp))
    }
}

struct CounterHttp;

impl CounterHttp {
    fn increment(&self) -> Result<Vec<u8>> {
        let (mut value, cas) = hostcall::get_shared_data(SHARED_KEY)?;
        if let Some(first) = value.first_mut() {
            *first = first.wrapping_add(1);
        }
        hostcall::set_shared_data(SHARED_KEY, &value, cas)?;
        Ok(value)
    }
}

impl HttpContext for CounterHttp {
    fn on_http_request_headers(&mut self, _num_headers: usize, _end_of_stream: bool) -> Action {
        loop {
            match self.increment() {
                Ok(value) => {
                    let current = value.first().copied().unwrap_or_default();
                    let _ = hostcall::log_info(&format!("shared value: {current}"));
                }
                Err(e) if e.is_cas_mismatch() => continue,
                Err(_) => {}
            }
            break;
        }
        Action::Continue
    }
}

fn start_plugin(root_id: u32) {
    set_root_context(|_| Box::new(CounterRoot));
    with_state(|s| {
        s.on_context_create(root_id, 0);
        assert!(s.deliver_root_event(
            root_id,
            RootEvent::VmStart {
                vm_configuration_size: 0
            }
        ));
    });
}

fn request(context_id: u32, root_id: u32) -> Action {
    with_state(|s| {
        s.on_context_create(context_id, root_id);
        let action = s.deliver_http_event(
            context_id,
            HttpEvent::RequestHeaders {
                num_headers: 0,
                end_of_stream: true,
            },
        );
        s.on_delete(context_id);
        action
    })
}

#[test]
fn test_vm_start_seeds_value() {
    let host = MockHost::new().install();
    start_plugin(1);

    let state = host.state();
    assert_eq!(state.shared.get(SHARED_KEY), Some(&(vec![0], 1)));
    assert_eq!(state.set_shared_attempts, 1);
}

#[test]
fn test_increment_with_matching_cas() {
    let host = MockHost::new().install();
    start_plugin(10);
    host.state_mut()
        .shared
        .insert(SHARED_KEY.to_string(), (vec![0], 7));
    host.state_mut().set_shared_attempts = 0;

    assert_eq!(request(11, 10), Action::Continue);

    let state = host.state();
    assert_eq!(state.set_shared_attempts, 1);
    assert_eq!(state.shared.get(SHARED_KEY), Some(&(vec![1], 8)));
    assert!(
        state
            .logs
            .iter()
            .any(|(level, message)| *level == LogLevel::Info && message == "shared value: 1")
    );
}

#[test]
fn test_cas_mismatch_retries_once() {
    let host = MockHost::new().install();
    start_plugin(20);
    {
        let mut state = host.state_mut();
        state.shared.insert(SHARED_KEY.to_string(), (vec![0], 7));
        state.set_shared_attempts = 0;
        state.forced_cas_mismatches = 1;
    }

    assert_eq!(request(21, 20), Action::Continue);

    let state = host.state();
    assert_eq!(state.set_shared_attempts, 2);
    assert_eq!(state.forced_cas_mismatches, 0);
    assert_eq!(state.shared.get(SHARED_KEY).map(|(v, _)| v.clone()), Some(vec![1]));
}

#[test]
fn test_requests_accumulate() {
    let host = MockHost::new().install();
    start_plugin(30);

    for id in 31..34 {
        request(id, 30);
    }

    assert_eq!(host.state().shared.get(SHARED_KEY).map(|(v, _)| v[0]), Some(3));
    assert!((31..34).all(|id| with_state(|s| s.kind_of(id)).is_none()));
}

#[test]
fn test_missing_key_is_not_retried() {
    let host = MockHost::new().install();
    set_root_context(|_| Box::new(CounterRoot));
    with_state(|s| s.on_context_create(40, 0));

    // No vm start, so the key was never seeded.
    assert_eq!(request(41, 40), Action::Continue);

    let state = host.state();
    assert_eq!(state.set_shared_attempts, 0);
    assert!(state.shared.is_empty());
}

#[test]
fn test_stale_token_is_cas_mismatch() {
    let host = MockHost::new().install();
    host.state_mut()
        .shared
        .insert(SHARED_KEY.to_string(), (vec![5], 3));

    let err = hostcall::set_shared_data(SHARED_KEY, &[6], 2).unwrap_err();
    assert!(err.is_cas_mismatch());
    assert_eq!(err.host_error(), Some(HostError::CasMismatch));

    hostcall::set_shared_data(SHARED_KEY, &[6], 3).unwrap();
    assert_eq!(hostcall::get_shared_data(SHARED_KEY).unwrap(), (vec![6], 4));
}
