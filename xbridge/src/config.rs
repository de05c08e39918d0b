/// Default size of a single socket read on the event loop.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 64 * 1024;

/// Default outbound high watermark before the write producer is paused.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Default)]
pub struct BridgeConfig {
    /// Buffer-size hint applied to the transport during initialization.
    pub buffer_size: Option<usize>,
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self { buffer_size: None }
    }

    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = Some(size);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ReactorConfig {
    pub read_chunk_size: usize,
    pub default_buffer_size: usize,
    pub thread_name: String,
}

impl ReactorConfig {
    pub fn new() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            default_buffer_size: DEFAULT_BUFFER_SIZE,
            thread_name: "xbridge-reactor".to_string(),
        }
    }

    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size.max(1);
        self
    }

    pub fn with_default_buffer_size(mut self, size: usize) -> Self {
        self.default_buffer_size = size;
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self::new()
    }
}
