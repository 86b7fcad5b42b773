//! Producer-side facade for the inference worker.
//!
//! Every method returns immediately: commands are only enqueued, never
//! executed on the caller's thread.

use super::events::{EventReceiver, WorkerEvent};
use super::queue::{Command, CommandSender};

pub struct Controller {
    commands: CommandSender,
    events: EventReceiver,
}

impl Controller {
    pub(crate) fn new(commands: CommandSender, events: EventReceiver) -> Self {
        Self { commands, events }
    }

    /// Open a new stream.  Ignored by the worker if one is already open.
    pub fn request_start(&self) {
        self.commands.push(Command::Start);
    }

    /// Queue little-endian 16-bit mono PCM for the open stream.
    pub fn submit_audio(&self, bytes: impl Into<Vec<u8>>) {
        self.commands.push(Command::AudioChunk(bytes.into()));
    }

    /// Close the open stream; its transcript arrives as a
    /// [`WorkerEvent::TranscriptReady`].
    pub fn request_stop(&self) {
        self.commands.push(Command::Finish);
    }

    /// A sink for audio callbacks running on another thread.
    pub fn audio_sink(&self) -> impl FnMut(Vec<u8>) + Send + 'static {
        let commands = self.commands.clone();
        move |bytes| commands.push(Command::AudioChunk(bytes))
    }

    /// Commands still waiting for the worker.
    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    /// See [`EventReceiver::set_waker`].
    pub fn set_waker(&self, wake: impl Fn() + Send + Sync + 'static) {
        self.events.set_waker(wake);
    }

    /// Hand every pending notification to `handler` on the calling thread.
    pub fn poll_events(&mut self, handler: impl FnMut(WorkerEvent)) -> usize {
        self.events.dispatch(handler)
    }

    pub fn events(&mut self) -> &mut EventReceiver {
        &mut self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::events::{event_channel, Transcript};
    use crate::worker::queue::command_queue;
    use std::time::Duration;

    #[test]
    fn requests_enqueue_commands_in_call_order() {
        let (tx, rx) = command_queue();
        let (_events_tx, events_rx) = event_channel();
        let controller = Controller::new(tx, events_rx);

        controller.request_start();
        controller.submit_audio([1u8, 0]);
        controller.request_stop();
        assert_eq!(controller.pending_commands(), 3);

        let drained: Vec<Command> = std::iter::from_fn(|| rx.try_pop()).collect();
        assert_eq!(
            drained,
            vec![Command::Start, Command::AudioChunk(vec![1, 0]), Command::Finish]
        );
    }

    #[test]
    fn audio_sink_works_from_another_thread() {
        let (tx, rx) = command_queue();
        let (_events_tx, events_rx) = event_channel();
        let controller = Controller::new(tx, events_rx);

        let mut sink = controller.audio_sink();
        std::thread::spawn(move || sink(vec![9, 9])).join().unwrap();

        assert_eq!(rx.pop(Duration::from_millis(100)), Ok(Command::AudioChunk(vec![9, 9])));
    }

    #[test]
    fn poll_events_drains_notifications() {
        let (tx, _rx) = command_queue();
        let (events_tx, events_rx) = event_channel();
        let mut controller = Controller::new(tx, events_rx);

        events_tx.send(WorkerEvent::TranscriptReady(Transcript {
            stream_id: 1,
            text: "hello".into(),
            samples: 0,
            decode_time: Duration::ZERO,
        }));

        let mut texts = Vec::new();
        let n = controller.poll_events(|e| {
            if let WorkerEvent::TranscriptReady(t) = e {
                texts.push(t.text);
            }
        });
        assert_eq!(n, 1);
        assert_eq!(texts, vec!["hello".to_string()]);
    }
}
