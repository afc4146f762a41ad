use peerwire::config::NetworkConfig;
use peerwire::protocol::gossip::Gossip;
use peerwire::protocol::kademlia::{Kademlia, Ping, Pong};
use peerwire::protocol::message::{Message, PeerId};
use peerwire::service::NodeBuilder;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_connections_share_one_node() {
    use tokio::task::JoinSet;

    let node = NodeBuilder::new(NetworkConfig::default())
        .bind(Kademlia::new())
        .bind(Gossip::new())
        .build()
        .unwrap();

    let iterations = 5_000u64;
    let connections = 32u64;

    let mut tasks = JoinSet::new();
    for conn in 0..connections {
        let node = node.clone();
        tasks.spawn(async move {
            let peer = PeerId::random();
            for i in 0..iterations {
                let nonce = conn * iterations + i;
                let wire = node.encode(&Message::Ping(Ping { nonce })).unwrap();
                let reply = node.handle_inbound(&peer, &wire).unwrap().unwrap();
                assert_eq!(node.decode(&reply).unwrap(), Message::Pong(Pong { nonce }));

                // hostile bytes on the same connection never disturb the others
                assert!(node.decode(&wire[..3]).is_err());
            }
        });
    }

    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }

    let snap = node.metrics().snapshot();
    let total = iterations * connections;
    assert_eq!(snap.messages_encoded, total * 2);
    assert_eq!(snap.messages_decoded, total * 2);
    assert_eq!(snap.truncated_envelopes, total);
}
