//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter | Implements                 | Connects to                  |
//! |---------|----------------------------|------------------------------|
//! | `sim`   | InputPin                   | scripted bouncing push-button|
//! |         | TwoWire                    | simulated DHT12              |
//! |         | LineTransport              | log output                   |
//! |         | StatefulOutputPin          | in-memory LED                |

pub mod sim;
