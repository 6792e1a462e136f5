//! Common test utilities and fixtures.
//!
//! [`MockHost`] is an in-memory stand-in for the proxy: header maps, buffers,
//! shared data with CAS tokens, properties and outbound calls. Tests keep a
//! clone to inspect what the plugin did after installing it with
//! `host::set_host`.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use proxy_shim::codec::{decode_map, decode_property_path, encode_map};
use proxy_shim::{BufferType, Headers, Host, HostError, LogLevel, MapType, StreamType};

/// One recorded outbound HTTP call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub upstream: String,
    pub headers: Headers,
    pub body: Vec<u8>,
    pub timeout_milliseconds: u32,
}

#[derive(Debug, Default)]
pub struct MockState {
    pub maps: HashMap<MapType, Headers>,
    pub buffers: HashMap<BufferType, Vec<u8>>,
    pub shared: HashMap<String, (Vec<u8>, u32)>,
    pub properties: HashMap<Vec<String>, Vec<u8>>,
    pub logs: Vec<(LogLevel, String)>,
    pub calls: Vec<RecordedCall>,
    pub continued: Vec<StreamType>,
    pub local_responses: Vec<(u32, Headers, Vec<u8>)>,
    /// Writes that fail with a CAS mismatch before any succeed.
    pub forced_cas_mismatches: usize,
    pub set_shared_attempts: usize,
    pub next_callout_id: u32,
}

#[derive(Clone, Default)]
pub struct MockHost(pub Rc<RefCell<MockState>>);

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a clone of this host for the current thread.
    pub fn install(&self) -> Self {
        proxy_shim::host::set_host(self.clone());
        self.clone()
    }

    pub fn with_map(self, map: MapType, pairs: &[(&str, &str)]) -> Self {
        self.0.borrow_mut().maps.insert(
            map,
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    pub fn with_buffer(self, buffer: BufferType, data: &[u8]) -> Self {
        self.0.borrow_mut().buffers.insert(buffer, data.to_vec());
        self
    }

    pub fn with_property(self, path: &[&str], value: &[u8]) -> Self {
        let key = path.iter().map(|s| s.to_string()).collect();
        self.0.borrow_mut().properties.insert(key, value.to_vec());
        self
    }

    pub fn state(&self) -> std::cell::Ref<'_, MockState> {
        self.0.borrow()
    }

    pub fn state_mut(&self) -> std::cell::RefMut<'_, MockState> {
        self.0.borrow_mut()
    }
}

impl Host for MockHost {
    fn log(&mut self, level: LogLevel, message: &str) -> Result<(), HostError> {
        self.0.borrow_mut().logs.push((level, message.to_string()));
        Ok(())
    }

    fn get_buffer_bytes(
        &mut self,
        buffer: BufferType,
        start: usize,
        max_size: usize,
    ) -> Result<Vec<u8>, HostError> {
        let state = self.0.borrow();
        let data = state.buffers.get(&buffer).ok_or(HostError::NotFound)?;
        let start = start.min(data.len());
        let end = start.saturating_add(max_size).min(data.len());
        Ok(data.get(start..end).unwrap_or_default().to_vec())
    }

    fn set_buffer_bytes(
        &mut self,
        buffer: BufferType,
        start: usize,
        size: usize,
        data: &[u8],
    ) -> Result<(), HostError> {
        let mut state = self.0.borrow_mut();
        let current = state.buffers.entry(buffer).or_default();
        let start = start.min(current.len());
        let end = start.saturating_add(size).min(current.len());
        current.splice(start..end, data.iter().copied());
        Ok(())
    }

    fn get_header_map_pairs(&mut self, map: MapType) -> Result<Vec<u8>, HostError> {
        // Absent maps come back as a zero-length reply.
        match self.0.borrow().maps.get(&map) {
            Some(pairs) => encode_map(pairs).map_err(|_| HostError::InternalFailure),
            None => Ok(Vec::new()),
        }
    }

    fn set_header_map_pairs(&mut self, map: MapType, encoded: &[u8]) -> Result<(), HostError> {
        let pairs = decode_map(encoded).map_err(|_| HostError::BadArgument)?;
        self.0.borrow_mut().maps.insert(map, pairs);
        Ok(())
    }

    fn get_header_map_value(&mut self, map: MapType, key: &str) -> Result<Vec<u8>, HostError> {
        let state = self.0.borrow();
        state
            .maps
            .get(&map)
            .and_then(|pairs| pairs.iter().find(|(k, _)| k == key))
            .map(|(_, v)| v.as_bytes().to_vec())
            .ok_or(HostError::NotFound)
    }

    fn replace_header_map_value(
        &mut self,
        map: MapType,
        key: &str,
        value: &str,
    ) -> Result<(), HostError> {
        let mut state = self.0.borrow_mut();
        let pairs = state.maps.entry(map).or_default();
        pairs.retain(|(k, _)| k != key);
        pairs.push((key.to_string(), value.to_string()));
        Ok(())
    }

    fn remove_header_map_value(&mut self, map: MapType, key: &str) -> Result<(), HostError> {
        let mut state = self.0.borrow_mut();
        if let Some(pairs) = state.maps.get_mut(&map) {
            pairs.retain(|(k, _)| k != key);
        }
        Ok(())
    }

    fn add_header_map_value(&mut self, map: MapType, key: &str, value: &str) -> Result<(), HostError> {
        let mut state = self.0.borrow_mut();
        state
            .maps
            .entry(map)
            .or_default()
            .push((key.to_string(), value.to_string()));
        Ok(())
    }

    fn continue_stream(&mut self, stream: StreamType) -> Result<(), HostError> {
        self.0.borrow_mut().continued.push(stream);
        Ok(())
    }

    fn send_local_response(
        &mut self,
        status_code: u32,
        _details: &str,
        body: &[u8],
        encoded_headers: &[u8],
        _grpc_status: i32,
    ) -> Result<(), HostError> {
        let headers = decode_map(encoded_headers).map_err(|_| HostError::BadArgument)?;
        self.0
            .borrow_mut()
            .local_responses
            .push((status_code, headers, body.to_vec()));
        Ok(())
    }

    fn http_call(
        &mut self,
        upstream: &str,
        encoded_headers: &[u8],
        body: &[u8],
        _encoded_trailers: &[u8],
        timeout_milliseconds: u32,
    ) -> Result<u32, HostError> {
        if upstream.is_empty() {
            return Err(HostError::BadArgument);
        }
        let headers = decode_map(encoded_headers).map_err(|_| HostError::BadArgument)?;
        let mut state = self.0.borrow_mut();
        state.next_callout_id += 1;
        state.calls.push(RecordedCall {
            upstream: upstream.to_string(),
            headers,
            body: body.to_vec(),
            timeout_milliseconds,
        });
        Ok(state.next_callout_id)
    }

    fn get_shared_data(&mut self, key: &str) -> Result<(Vec<u8>, u32), HostError> {
        self.0
            .borrow()
            .shared
            .get(key)
            .cloned()
            .ok_or(HostError::NotFound)
    }

    fn set_shared_data(&mut self, key: &str, value: &[u8], cas: u32) -> Result<(), HostError> {
        let mut state = self.0.borrow_mut();
        state.set_shared_attempts += 1;

        if state.forced_cas_mismatches > 0 {
            // Another writer got there first.
            state.forced_cas_mismatches -= 1;
            if let Some((_, token)) = state.shared.get_mut(key) {
                *token += 1;
            }
            return Err(HostError::CasMismatch);
        }

        let current = state.shared.get(key).map_or(0, |(_, token)| *token);
        if cas != 0 && cas != current {
            return Err(HostError::CasMismatch);
        }
        state.shared.insert(key.to_string(), (value.to_vec(), current + 1));
        Ok(())
    }

    fn get_property(&mut self, path: &[u8]) -> Result<Vec<u8>, HostError> {
        let path = decode_property_path(path).map_err(|_| HostError::BadArgument)?;
        self.0
            .borrow()
            .properties
            .get(&path)
            .cloned()
            .ok_or(HostError::NotFound)
    }

    fn set_property(&mut self, path: &[u8], value: &[u8]) -> Result<(), HostError> {
        let path = decode_property_path(path).map_err(|_| HostError::BadArgument)?;
        self.0.borrow_mut().properties.insert(path, value.to_vec());
        Ok(())
    }
}
