//! Transport traits and outbound routing
//!
//! Components never perform I/O. They return [`Outbound`] values naming a
//! [`Destination`]; the session hands the encoded bytes to a [`Connection`]
//! implemented for the chosen network stack.

use crate::{Error, Message, Result};
use melee_core::JoinerIndex;

/// Where an outbound message should go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    /// The host process
    Host,
    /// One joiner
    Joiner(JoinerIndex),
    /// Every connected joiner
    AllJoiners,
    /// Every connected joiner except one
    AllJoinersExcept(JoinerIndex),
}

impl Destination {
    /// Check if a joiner is among the recipients
    pub fn includes(&self, joiner: JoinerIndex) -> bool {
        match self {
            Destination::Host => false,
            Destination::Joiner(target) => *target == joiner,
            Destination::AllJoiners => true,
            Destination::AllJoinersExcept(excluded) => *excluded != joiner,
        }
    }
}

/// A message waiting to be delivered
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub to: Destination,
    pub message: Message,
}

impl Outbound {
    /// Address a message to the host
    pub fn to_host(message: Message) -> Self {
        Self {
            to: Destination::Host,
            message,
        }
    }

    /// Address a message to one joiner
    pub fn to_joiner(joiner: JoinerIndex, message: Message) -> Self {
        Self {
            to: Destination::Joiner(joiner),
            message,
        }
    }

    /// Address a message to every joiner
    pub fn broadcast(message: Message) -> Self {
        Self {
            to: Destination::AllJoiners,
            message,
        }
    }

    /// Address a message to every joiner but one
    pub fn broadcast_except(excluded: JoinerIndex, message: Message) -> Self {
        Self {
            to: Destination::AllJoinersExcept(excluded),
            message,
        }
    }
}

/// Reliable, ordered connection to one peer (e.g., WebSocket, WebRTC data channel)
pub trait Connection {
    /// Error type for this connection
    type Error: std::error::Error + 'static;

    /// Send data (guaranteed delivery, ordered)
    fn send(&self, data: &[u8]) -> std::result::Result<(), Self::Error>;

    /// Receive data (non-blocking)
    ///
    /// Returns `Ok(None)` if no data is available.
    fn recv(&self) -> std::result::Result<Option<Vec<u8>>, Self::Error>;

    /// Check if the connection is still alive
    fn is_connected(&self) -> bool;

    /// Close the connection gracefully
    fn close(&self) -> std::result::Result<(), Self::Error>;
}

/// Encode a message and send it over a connection
pub fn send_message<C: Connection>(connection: &C, message: &Message) -> Result<()> {
    let bytes = message.encode()?;
    connection
        .send(&bytes)
        .map_err(|err| Error::Transport(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Rename, ReadyState};
    use std::cell::RefCell;
    use std::collections::{BTreeMap, VecDeque};
    use std::fmt;

    #[derive(Debug)]
    struct Closed;

    impl fmt::Display for Closed {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "connection closed")
        }
    }

    impl std::error::Error for Closed {}

    #[derive(Default)]
    struct Pipe {
        queue: RefCell<VecDeque<Vec<u8>>>,
        closed: RefCell<bool>,
    }

    impl Connection for Pipe {
        type Error = Closed;

        fn send(&self, data: &[u8]) -> std::result::Result<(), Closed> {
            if *self.closed.borrow() {
                return Err(Closed);
            }
            self.queue.borrow_mut().push_back(data.to_vec());
            Ok(())
        }

        fn recv(&self) -> std::result::Result<Option<Vec<u8>>, Closed> {
            Ok(self.queue.borrow_mut().pop_front())
        }

        fn is_connected(&self) -> bool {
            !*self.closed.borrow()
        }

        fn close(&self) -> std::result::Result<(), Closed> {
            *self.closed.borrow_mut() = true;
            Ok(())
        }
    }

    #[test]
    fn test_destination_includes() {
        let a = JoinerIndex::new(0);
        let b = JoinerIndex::new(1);

        assert!(!Destination::Host.includes(a));
        assert!(Destination::Joiner(a).includes(a));
        assert!(!Destination::Joiner(a).includes(b));
        assert!(Destination::AllJoiners.includes(b));
        assert!(!Destination::AllJoinersExcept(a).includes(a));
        assert!(Destination::AllJoinersExcept(a).includes(b));
    }

    #[test]
    fn test_send_message_over_connection() {
        let pipe = Pipe::default();
        let message = Message::ReadyState(ReadyState::Full(BTreeMap::new()));

        send_message(&pipe, &message).unwrap();
        let bytes = pipe.recv().unwrap().unwrap();
        assert_eq!(Message::decode(&bytes).unwrap(), message);
    }

    #[test]
    fn test_send_on_closed_connection() {
        let pipe = Pipe::default();
        pipe.close().unwrap();
        assert!(!pipe.is_connected());

        let message = Message::Rename(Rename {
            joiner: JoinerIndex::new(0),
            name: "Kes".to_string(),
        });
        assert!(matches!(
            send_message(&pipe, &message),
            Err(Error::Transport(_))
        ));
    }
}
