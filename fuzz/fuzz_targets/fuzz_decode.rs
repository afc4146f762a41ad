#![no_main]

use libfuzzer_sys::fuzz_target;
use peerwire::config::NetworkConfig;
use peerwire::protocol::gossip::Gossip;
use peerwire::protocol::kademlia::Kademlia;
use peerwire::service::NodeBuilder;
use peerwire::PeerId;

fuzz_target!(|data: &[u8]| {
    // Inbound envelopes must only ever produce typed errors, never panics
    let node = NodeBuilder::new(NetworkConfig::default())
        .bind(Kademlia::new())
        .bind(Gossip::new())
        .build()
        .unwrap();
    let _ = node.handle_inbound(&PeerId::default(), data);
});
