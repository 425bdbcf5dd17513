use querybind::{BindError, BindResult, QueryState, Result, SqlQuery, Value};

/// Backend that records which typed binder each dispatch lands on
struct RecordingBackend {
    state: QueryState,
    calls: Vec<(usize, String)>,
}

impl RecordingBackend {
    fn new() -> Self {
        RecordingBackend {
            state: QueryState::new(),
            calls: Vec::new(),
        }
    }

    fn record(&mut self, index: usize, call: String) -> BindResult {
        self.calls.push((index, call));
        Ok(())
    }
}

impl SqlQuery for RecordingBackend {
    fn state(&self) -> &QueryState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut QueryState {
        &mut self.state
    }

    fn run(&mut self) -> Result<()> {
        Ok(())
    }

    fn bind_u8(&mut self, index: usize, value: u8) -> BindResult {
        self.record(index, format!("u8:{value}"))
    }

    fn bind_u16(&mut self, index: usize, value: u16) -> BindResult {
        self.record(index, format!("u16:{value}"))
    }

    fn bind_u32(&mut self, index: usize, value: u32) -> BindResult {
        self.record(index, format!("u32:{value}"))
    }

    fn bind_u64(&mut self, index: usize, value: u64) -> BindResult {
        self.record(index, format!("u64:{value}"))
    }

    fn bind_i8(&mut self, index: usize, value: i8) -> BindResult {
        self.record(index, format!("i8:{value}"))
    }

    fn bind_i16(&mut self, index: usize, value: i16) -> BindResult {
        self.record(index, format!("i16:{value}"))
    }

    fn bind_i32(&mut self, index: usize, value: i32) -> BindResult {
        self.record(index, format!("i32:{value}"))
    }

    fn bind_i64(&mut self, index: usize, value: i64) -> BindResult {
        self.record(index, format!("i64:{value}"))
    }

    fn bind_f32(&mut self, index: usize, value: f32) -> BindResult {
        self.record(index, format!("f32:{value}"))
    }

    fn bind_f64(&mut self, index: usize, value: f64) -> BindResult {
        self.record(index, format!("f64:{value}"))
    }

    fn bind_text(&mut self, index: usize, value: &str) -> BindResult {
        self.record(index, format!("text:{value}"))
    }
}

/// Backend supporting exactly one scalar kind, to pin that dispatch
/// honors width and signedness instead of casting across them
struct U16OnlyBackend {
    state: QueryState,
    bound: Option<(usize, u16)>,
}

impl U16OnlyBackend {
    fn new() -> Self {
        U16OnlyBackend {
            state: QueryState::new(),
            bound: None,
        }
    }
}

impl SqlQuery for U16OnlyBackend {
    fn state(&self) -> &QueryState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut QueryState {
        &mut self.state
    }

    fn run(&mut self) -> Result<()> {
        Ok(())
    }

    fn bind_u16(&mut self, index: usize, value: u16) -> BindResult {
        self.bound = Some((index, value));
        Ok(())
    }
}

#[test]
fn every_scalar_tag_routes_to_its_matching_binder() {
    let mut q = RecordingBackend::new();
    q.bind_value(0, &Value::Text("abc".to_string())).unwrap();
    q.bind_value(1, &Value::Float(1.5)).unwrap();
    q.bind_value(2, &Value::Double(2.5)).unwrap();
    q.bind_value(3, &Value::Int8(-8)).unwrap();
    q.bind_value(4, &Value::Int16(-16)).unwrap();
    q.bind_value(5, &Value::Int32(-32)).unwrap();
    q.bind_value(6, &Value::Int64(-64)).unwrap();
    q.bind_value(7, &Value::UInt8(8)).unwrap();
    q.bind_value(8, &Value::UInt16(16)).unwrap();
    q.bind_value(9, &Value::UInt32(32)).unwrap();
    q.bind_value(10, &Value::UInt64(64)).unwrap();

    let expected = [
        (0, "text:abc"),
        (1, "f32:1.5"),
        (2, "f64:2.5"),
        (3, "i8:-8"),
        (4, "i16:-16"),
        (5, "i32:-32"),
        (6, "i64:-64"),
        (7, "u8:8"),
        (8, "u16:16"),
        (9, "u32:32"),
        (10, "u64:64"),
    ];
    assert_eq!(q.calls.len(), expected.len());
    for ((index, call), (want_index, want_call)) in q.calls.iter().zip(expected.iter()) {
        assert_eq!(index, want_index);
        assert_eq!(call, want_call);
    }
}

#[test]
fn null_dispatch_calls_no_binder() {
    let mut q = RecordingBackend::new();
    q.bind_value(0, &Value::Null).unwrap();
    assert!(q.calls.is_empty());
}

#[test]
fn object_dispatch_fails_even_on_full_backend() {
    let mut q = RecordingBackend::new();
    let result = q.bind_value(0, &Value::Object(serde_json::json!([1, 2, 3])));
    assert!(matches!(result, Err(BindError::UnsupportedType { .. })));
    assert!(q.calls.is_empty());
}

#[test]
fn u16_only_backend_accepts_dynamic_u16() {
    let mut q = U16OnlyBackend::new();
    q.bind_value(3, &Value::UInt16(500)).unwrap();
    assert_eq!(q.bound, Some((3, 500)));
}

#[test]
fn u16_only_backend_rejects_dynamic_i16() {
    // Same width, different signedness: must not be coerced across
    let mut q = U16OnlyBackend::new();
    match q.bind_value(3, &Value::Int16(500)) {
        Err(BindError::UnsupportedBinding(kind)) => assert_eq!(kind, "int16"),
        other => panic!("expected UnsupportedBinding, got {other:?}"),
    }
    assert_eq!(q.bound, None);
}

#[test]
fn u16_only_backend_still_binds_null() {
    let mut q = U16OnlyBackend::new();
    assert!(q.bind_value(0, &Value::Null).is_ok());
    assert_eq!(q.bound, None);
}

#[test]
fn values_converted_from_json_dispatch_by_width_class() {
    let mut q = RecordingBackend::new();
    q.bind_value(0, &Value::from(serde_json::json!(-3))).unwrap();
    q.bind_value(1, &Value::from(serde_json::json!(2.5))).unwrap();
    q.bind_value(2, &Value::from(serde_json::json!("hi"))).unwrap();
    assert_eq!(q.calls[0].1, "i64:-3");
    assert_eq!(q.calls[1].1, "f64:2.5");
    assert_eq!(q.calls[2].1, "text:hi");

    // JSON null arrives as Value::Null and never reaches a binder
    q.bind_value(3, &Value::from(serde_json::json!(null))).unwrap();
    assert_eq!(q.calls.len(), 3);
}
