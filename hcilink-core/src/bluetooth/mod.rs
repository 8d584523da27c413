/*!
 * Bluetooth Device Discovery and Connection
 * Low-level HCI commands issued through the adapter-control tool
 */

pub mod connection;
pub mod scanner;

pub use connection::ConnectionRequester;
pub use scanner::DeviceScanner;
