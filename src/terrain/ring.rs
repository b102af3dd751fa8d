use glam::Mat4;

/// One transform array per frame in flight.
///
/// The CPU writes only the slot of the frame being prepared while the GPU may
/// still read the others.
pub struct TransformRing {
    slots: Vec<Box<[Mat4]>>,
}

impl TransformRing {
    pub fn new(frames_in_flight: usize, initial: &[Mat4]) -> Self {
        assert!(frames_in_flight > 0, "at least one frame in flight is required");
        Self {
            slots: (0..frames_in_flight).map(|_| initial.into()).collect(),
        }
    }

    pub fn frames_in_flight(&self) -> usize {
        self.slots.len()
    }

    pub fn slot_index(&self, frame_index: usize) -> usize {
        frame_index % self.slots.len()
    }

    /// Copy `transforms` into the slot owned by `frame_index`
    pub fn publish(&mut self, frame_index: usize, transforms: &[Mat4]) -> &[Mat4] {
        let slot = self.slot_index(frame_index);
        self.slots[slot].copy_from_slice(transforms);
        &self.slots[slot]
    }

    pub fn slot(&self, frame_index: usize) -> &[Mat4] {
        &self.slots[self.slot_index(frame_index)]
    }
}
