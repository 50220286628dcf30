/// Circular delay line sized at construction for the longest supported
/// delay time. A delay of zero samples is a passthrough.
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    pub fn new(max_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; max_samples.max(1)],
            write_pos: 0,
        }
    }

    pub fn next_sample(&mut self, sample: f32, delay_samples: usize) -> f32 {
        let capacity = self.buffer.len();
        let delay_samples = delay_samples.min(capacity - 1);

        self.buffer[self.write_pos] = sample;

        let read_pos = (self.write_pos + capacity - delay_samples) % capacity;
        let delayed = self.buffer[read_pos];

        self.write_pos = (self.write_pos + 1) % capacity;

        delayed
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}
