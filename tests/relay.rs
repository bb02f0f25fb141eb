mod support;

use futures_util::SinkExt;
use grenade_server::domain::packet::SpawnMessage;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;

// Tests share one host, so assertions only look at bytes unique to the test.

#[tokio::test]
async fn when_peer_fires_then_others_get_identical_bytes_and_sender_gets_none() {
    let (mut a, a_id) = support::connect_peer().await;
    let (mut b, _) = support::connect_peer().await;
    let trigger = SpawnMessage { peer_id: a_id }.encode();

    a.send(Message::Binary(trigger.clone().into()))
        .await
        .expect("send trigger");

    let received = support::binaries_within(&mut b, Duration::from_millis(800)).await;
    assert!(received.contains(&trigger));

    let echoed = support::binaries_within(&mut a, Duration::from_millis(300)).await;
    assert!(!echoed.contains(&trigger));
}

#[tokio::test]
async fn when_peer_fires_then_world_updates_show_its_volley() {
    let (mut a, a_id) = support::connect_peer().await;
    let owner = a_id.to_string();

    a.send(Message::Binary(SpawnMessage { peer_id: a_id }.encode().into()))
        .await
        .expect("send trigger");

    let update = support::world_update_where(&mut a, |data| {
        data["grenades"]
            .as_array()
            .is_some_and(|g| g.iter().filter(|g| g["owner_id"] == owner.as_str()).count() == 3)
    })
    .await;
    assert!(update["tick"].as_u64().is_some());
}

#[tokio::test]
async fn when_envelope_has_foreign_tag_then_it_is_not_relayed() {
    let (mut a, a_id) = support::connect_peer().await;
    let (mut b, _) = support::connect_peer().await;
    let mut foreign = vec![0x20, 0];
    foreign.extend_from_slice(b"OTHERMD");
    foreign.extend_from_slice(&a_id.to_le_bytes());

    a.send(Message::Binary(foreign.clone().into()))
        .await
        .expect("send foreign envelope");

    let received = support::binaries_within(&mut b, Duration::from_millis(500)).await;
    assert!(!received.contains(&foreign));
}

#[tokio::test]
async fn when_pose_is_sent_then_ship_moves_in_world_updates() {
    let (mut a, a_id) = support::connect_peer().await;
    let id = a_id.to_string();
    let pose = serde_json::json!({
        "type": "Pose",
        "data": {
            "position": [4.0, 1.0, -50.0],
            "rotation": [0.0, 0.0, 0.0, 1.0],
            "velocity": [0.0, 0.0, 0.0]
        }
    });

    a.send(Message::Text(pose.to_string().into()))
        .await
        .expect("send pose");

    support::world_update_where(&mut a, |data| {
        data["ships"].as_array().is_some_and(|ships| {
            ships
                .iter()
                .any(|s| s["id"] == id.as_str() && s["position"][2] == -50.0)
        })
    })
    .await;
}
