use crate::error::QueueError;

const DEFAULT_CAPACITY: usize = 10;

/// FIFO ring buffer, doubling its storage when full.
pub struct AppointmentQueue<T> {
    slots: Vec<Option<T>>,
    front: usize,
    len: usize,
}

pub struct AppointmentQueueIterator<'a, T> {
    queue: &'a AppointmentQueue<T>,
    pos: usize,
}

impl<T> AppointmentQueue<T> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::new();
        slots.resize_with(capacity.max(1), || None);
        Self{slots, front: 0, len: 0}
    }

    fn grow(&mut self) {
        let capacity = self.slots.len();
        let mut slots = Vec::with_capacity(capacity * 2);
        for i in 0..self.len {
            slots.push(self.slots[(self.front + i) % capacity].take());
        }
        slots.resize_with(capacity * 2, || None);
        self.slots = slots;
        self.front = 0;
    }

    pub fn enqueue(&mut self, item: T) {
        if self.len == self.slots.len() {
            self.grow();
        }
        let rear = (self.front + self.len) % self.slots.len();
        self.slots[rear] = Some(item);
        self.len += 1;
    }

    pub fn dequeue(&mut self) -> Result<T, QueueError> {
        if self.len == 0 {
            return Err(QueueError::Empty);
        }
        let item = self.slots[self.front].take().ok_or(QueueError::Empty)?;
        self.front = (self.front + 1) % self.slots.len();
        self.len -= 1;
        Ok(item)
    }

    pub fn peek(&self) -> Result<&T, QueueError> {
        if self.len == 0 {
            return Err(QueueError::Empty);
        }
        self.slots[self.front].as_ref().ok_or(QueueError::Empty)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn iter(&self) -> AppointmentQueueIterator<'_, T> {
        AppointmentQueueIterator{queue: self, pos: 0}
    }
}

impl<T> Default for AppointmentQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> Iterator for AppointmentQueueIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.queue.len {
            return None;
        }
        let slot = (self.queue.front + self.pos) % self.queue.slots.len();
        self.pos += 1;
        self.queue.slots[slot].as_ref()
    }
}


#[test]
fn test_fifo_order() {
    let mut q = AppointmentQueue::new();
    for id in [3, 2, 1, 4, 5] {
        q.enqueue(id);
    }
    assert_eq!(q.peek(), Ok(&3));
    let out: Vec<u32> = (0..5).map(|_| q.dequeue().unwrap()).collect();
    assert_eq!(out, vec![3, 2, 1, 4, 5]);
    assert_eq!(q.dequeue(), Err(QueueError::Empty));
    assert_eq!(q.peek(), Err(QueueError::Empty));
}

#[test]
fn test_grow_after_wrap() {
    let mut q = AppointmentQueue::with_capacity(4);
    for i in 0..3 {
        q.enqueue(i);
    }
    assert_eq!(q.dequeue(), Ok(0));
    assert_eq!(q.dequeue(), Ok(1));
    for i in 3..9 {
        q.enqueue(i);
    }
    assert_eq!(q.capacity(), 8);
    assert_eq!(q.len(), 7);
    assert_eq!(q.iter().copied().collect::<Vec<_>>(), (2..9).collect::<Vec<_>>());
    for i in 2..9 {
        assert_eq!(q.dequeue(), Ok(i));
    }
    assert!(q.is_empty());
}
