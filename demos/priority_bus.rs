//! # Example: priority_bus
//!
//! Handlers on ordered addresses, reentrant disconnects and address retirement.
//!
//! Demonstrates how to:
//! - Describe a bus with [`BusTraits`] (`ByIdAndOrdered` addresses, [`Ordered`] handlers).
//! - Connect handlers that sort by a priority they report through [`Compare`].
//! - Disconnect a handler from inside its own callback.
//! - Watch addresses being created and retired through `tracing`.
//! - Tolerate a double connect on a [`Single`] address with [`ViolationMode::Log`].
//!
//! ## Flow
//! ```text
//! connect(channel, handler) ──► address created (debug)
//! broadcast(mix)
//!   ├─► channel 1: ducking(0) ─► music(5) ─► sfx(5)
//!   └─► channel 2: voice(1)   (disconnects itself)
//! drop connections ──► address retired (debug)
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=handlerbus=debug cargo run --example priority_bus
//! ```

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::rc::Rc;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use handlerbus::{
    AddressPolicy, Bus, BusConfig, BusTraits, Compare, Connection, Ordered, Single, ViolationMode,
};

/// Audio mixer callbacks.
trait Mixer: Compare<Order = i32> {
    fn mix(&self, frame: u64);
    fn label(&self) -> &str;
}

struct Channels;

impl BusTraits for Channels {
    type Handler = dyn Mixer;
    type BusId = u8;
    type Storage = Ordered<dyn Mixer>;
    const ADDRESS_POLICY: AddressPolicy = AddressPolicy::ByIdAndOrdered;

    fn bus_id_order(left: &u8, right: &u8) -> Ordering {
        left.cmp(right)
    }
}

/// One output device; only one driver may own it.
struct Device;

impl BusTraits for Device {
    type Handler = dyn Mixer;
    type BusId = ();
    type Storage = Single<dyn Mixer>;
}

struct Stage {
    name: String,
    priority: i32,
    calls: Cell<u32>,
}

impl Stage {
    fn new(name: &str, priority: i32) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            priority,
            calls: Cell::new(0),
        })
    }
}

impl Compare for Stage {
    type Order = i32;
    fn order(&self) -> i32 {
        self.priority
    }
}

impl Mixer for Stage {
    fn mix(&self, frame: u64) {
        self.calls.set(self.calls.get() + 1);
        println!("[frame {frame}] {} (priority {})", self.name, self.priority);
    }

    fn label(&self) -> &str {
        &self.name
    }
}

/// Plays once, then disconnects itself.
struct OneShot {
    name: String,
    connection: Rc<RefCell<Option<Connection<Channels>>>>,
}

impl Compare for OneShot {
    type Order = i32;
    fn order(&self) -> i32 {
        1
    }
}

impl Mixer for OneShot {
    fn mix(&self, frame: u64) {
        println!("[frame {frame}] {} (one-shot, disconnecting)", self.name);
        self.connection.borrow_mut().take();
    }

    fn label(&self) -> &str {
        &self.name
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("handlerbus=debug".parse()?))
        .init();

    let bus = Bus::<Channels>::new(BusConfig::named("mixer"));

    let music = Stage::new("music", 5);
    let sfx = Stage::new("sfx", 5);
    let ducking = Stage::new("ducking", 0);
    let music_h: Arc<dyn Mixer> = music.clone();
    let sfx_h: Arc<dyn Mixer> = sfx.clone();
    let ducking_h: Arc<dyn Mixer> = ducking;

    let connections = vec![
        bus.connect(1, &music_h),
        bus.connect(1, &sfx_h),
        bus.connect(1, &ducking_h),
    ];

    let slot = Rc::new(RefCell::new(None));
    let voice: Arc<dyn Mixer> = Arc::new(OneShot {
        name: "voice".to_string(),
        connection: Rc::clone(&slot),
    });
    *slot.borrow_mut() = Some(bus.connect(2, &voice));

    for frame in 0..2 {
        bus.broadcast(|h| h.mix(frame));
    }
    println!(
        "addresses: {}, handlers: {}, music mixed {} times",
        bus.bus_count(),
        bus.total_handlers(),
        music.calls.get()
    );

    let first = bus
        .find_first_handler(&1)
        .map(|h| h.label().to_string())
        .unwrap_or_default();
    println!("channel 1 starts with: {first}");

    drop(connections);
    println!("after disconnect: addresses = {}", bus.bus_count());

    // A second driver on a Single address is a contract violation; in Log
    // mode it is reported and the newer driver takes over.
    let device = Bus::<Device>::new(BusConfig {
        violation: ViolationMode::Log,
        ..BusConfig::named("device")
    });
    let alsa: Arc<dyn Mixer> = Stage::new("alsa", 0);
    let pulse: Arc<dyn Mixer> = Stage::new("pulse", 0);
    let old = device.connect((), &alsa);
    let new = device.connect((), &pulse);
    println!(
        "device driver: alsa connected = {}, pulse connected = {}",
        old.is_connected(),
        new.is_connected()
    );

    Ok(())
}
