/// Integration tests for the game service and sync hub
///
/// Each test wires a registry, a live hub actor and in-memory outbound
/// queues, then plays through the service the way websocket connections do.
use std::sync::Arc;
use tiffin::{
    Card, ClientMessage, GamePhase, GameService, GameView, HubActor, HubConfig, PlayerId, RoomId,
    RoomRegistry, ServerMessage, Session,
};
use tokio::sync::mpsc;

struct Client {
    session: Session,
    frames: mpsc::Receiver<String>,
}

impl Client {
    /// Everything queued so far, after the hub has caught up.
    async fn drain(&mut self, service: &GameService) -> Vec<ServerMessage> {
        service.hub().connection_count(None).await.unwrap();
        let mut out = Vec::new();
        while let Ok(text) = self.frames.try_recv() {
            out.push(serde_json::from_str(&text).unwrap());
        }
        out
    }

    async fn last_state(&mut self, service: &GameService) -> GameView {
        self.drain(service)
            .await
            .into_iter()
            .rev()
            .find_map(|m| match m {
                ServerMessage::GameState(view) => Some(view),
                _ => None,
            })
            .expect("no game_state received")
    }
}

fn service() -> GameService {
    GameService::new(
        Arc::new(RoomRegistry::default()),
        HubActor::spawn(&HubConfig::default()),
    )
}

async fn connect(service: &GameService, room: &RoomId, player: &PlayerId) -> Client {
    let (tx, frames) = service.hub().outbound_channel();
    let session = service.connect(room, player, tx).await.unwrap();
    Client { session, frames }
}

async fn two_player_room(service: &GameService) -> (RoomId, Client, Client) {
    let (room, host) = service.create_room("Asha").await;
    let guest = service.join_room(&room, "Ravi").await.unwrap();
    let mut host = connect(service, &room, &host).await;
    let mut guest = connect(service, &room, &guest).await;
    host.drain(service).await;
    guest.drain(service).await;
    (room, host, guest)
}

async fn send(service: &GameService, client: &Client, frame: &str) {
    service.handle_frame(&client.session, frame).await.unwrap();
}

#[tokio::test]
async fn test_join_announces_new_player() {
    let service = service();
    let (room, host_id) = service.create_room("Asha").await;
    let mut host = connect(&service, &room, &host_id).await;
    host.drain(&service).await;

    let guest_id = service.join_room(&room, "  Ravi ").await.unwrap();

    let frames = host.drain(&service).await;
    assert_eq!(frames.len(), 2);
    assert_eq!(
        frames[0],
        ServerMessage::PlayerJoined {
            player_id: guest_id,
            player_name: "Ravi".to_string(),
        }
    );
    match &frames[1] {
        ServerMessage::GameState(view) => assert_eq!(view.players.len(), 2),
        other => panic!("expected game_state, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_host_start_rejected_to_sender_only() {
    let service = service();
    let (_room, mut host, mut guest) = two_player_room(&service).await;

    send(&service, &guest, r#"{"type":"start_game","data":{}}"#).await;

    assert_eq!(
        guest.drain(&service).await,
        vec![ServerMessage::error("only host can start the game")]
    );
    assert!(host.drain(&service).await.is_empty());
}

#[tokio::test]
async fn test_host_start_sends_private_views() {
    let service = service();
    let (_room, mut host, mut guest) = two_player_room(&service).await;

    send(&service, &host, r#"{"type":"start_game","data":{}}"#).await;

    let host_view = host.last_state(&service).await;
    let guest_view = guest.last_state(&service).await;
    assert_eq!(host_view.state, GamePhase::Playing);
    assert_eq!(host_view.round, 1);

    let me = host_view.me().unwrap();
    assert_eq!(me.id, host.session.player_id);
    assert_eq!(me.hand.as_ref().unwrap().len(), 10);
    assert!(host_view.players.iter().filter(|p| !p.is_me).all(|p| p.hand.is_none()));

    let me = guest_view.me().unwrap();
    assert_eq!(me.id, guest.session.player_id);
    assert!(guest_view.players.iter().filter(|p| !p.is_me).all(|p| p.hand.is_none()));
}

#[tokio::test]
async fn test_get_state_only_to_requester() {
    let service = service();
    let (_room, mut host, mut guest) = two_player_room(&service).await;

    send(&service, &guest, r#"{"type":"get_state","data":{}}"#).await;

    assert_eq!(guest.drain(&service).await.len(), 1);
    assert!(host.drain(&service).await.is_empty());
}

#[tokio::test]
async fn test_select_card_cascade() {
    let service = service();
    let (_room, mut host, mut guest) = two_player_room(&service).await;
    send(&service, &host, r#"{"type":"start_game","data":{}}"#).await;
    host.drain(&service).await;
    guest.drain(&service).await;

    send(&service, &host, r#"{"type":"select_card","data":{"card_index":0}}"#).await;
    let view = guest.last_state(&service).await;
    assert_eq!(view.turn, 1);
    let host_entry = view.players.iter().find(|p| !p.is_me).unwrap();
    assert!(host_entry.has_selected);
    assert_eq!(host_entry.played_cards.len(), 1);
    assert_eq!(host_entry.hand_size, 9);
    host.drain(&service).await;

    send(&service, &guest, r#"{"type":"select_card","data":{"card_index":0}}"#).await;
    // One view after the selection, one after the hands moved.
    let frames = host.drain(&service).await;
    assert_eq!(frames.len(), 2);
    let ServerMessage::GameState(view) = &frames[1] else {
        panic!("expected game_state");
    };
    assert_eq!(view.turn, 2);
    assert!(view.players.iter().all(|p| !p.has_selected));
    assert!(view.players.iter().all(|p| p.hand_size == 9));
}

#[tokio::test]
async fn test_invalid_selection_reports_error() {
    let service = service();
    let (_room, mut host, mut guest) = two_player_room(&service).await;
    send(&service, &host, r#"{"type":"start_game","data":{}}"#).await;
    host.drain(&service).await;
    guest.drain(&service).await;

    send(&service, &host, r#"{"type":"select_card","data":{"card_index":-1}}"#).await;
    assert_eq!(
        host.drain(&service).await,
        vec![ServerMessage::error("invalid card index")]
    );

    send(&service, &host, r#"{"type":"select_card","data":{"card_index":0}}"#).await;
    host.drain(&service).await;
    send(&service, &host, r#"{"type":"select_card","data":{"card_index":0}}"#).await;
    assert_eq!(
        host.drain(&service).await,
        vec![ServerMessage::error(
            "player has already selected a card this turn"
        )]
    );
    // Guest saw only the one accepted selection.
    assert_eq!(guest.drain(&service).await.len(), 1);
}

#[tokio::test]
async fn test_select_before_start() {
    let service = service();
    let (_room, mut host, _guest) = two_player_room(&service).await;

    send(&service, &host, r#"{"type":"select_card","data":{"card_index":0}}"#).await;
    assert_eq!(
        host.drain(&service).await,
        vec![ServerMessage::error("game is not in playing state")]
    );
}

#[tokio::test]
async fn test_disconnect_closes_queue() {
    let service = service();
    let (room, mut host, _guest) = two_player_room(&service).await;

    service.disconnect(&host.session).await.unwrap();

    assert_eq!(
        service.hub().connection_count(Some(room)).await.unwrap(),
        1
    );
    assert!(host.frames.recv().await.is_none());
}

#[tokio::test]
async fn test_leave_mid_game_advances_room() {
    let service = service();
    let (room, mut host, guest) = two_player_room(&service).await;
    let third = service.join_room(&room, "Meera").await;
    assert!(third.is_ok());
    send(&service, &host, r#"{"type":"start_game","data":{}}"#).await;

    send(&service, &host, r#"{"type":"select_card","data":{"card_index":0}}"#).await;
    send(&service, &guest, r#"{"type":"select_card","data":{"card_index":0}}"#).await;
    host.drain(&service).await;

    let closed = service
        .leave_room(&room, &third.unwrap())
        .await
        .unwrap();
    assert!(!closed);

    let view = host.last_state(&service).await;
    assert_eq!(view.players.len(), 2);
    assert_eq!(view.turn, 2);
}

#[tokio::test]
async fn test_rooms_are_isolated() {
    let service = service();
    let (_a, mut host_a, _guest_a) = two_player_room(&service).await;
    let (_b, mut host_b, _guest_b) = two_player_room(&service).await;

    send(&service, &host_a, r#"{"type":"start_game","data":{}}"#).await;

    assert!(!host_a.drain(&service).await.is_empty());
    assert!(host_b.drain(&service).await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_join_announced_before_later_state() {
    for _ in 0..25 {
        let service = service();
        let (room, host_id) = service.create_room("Asha").await;
        service.join_room(&room, "Ravi").await.unwrap();
        let mut host = connect(&service, &room, &host_id).await;
        host.drain(&service).await;

        let joiner = {
            let service = service.clone();
            let room = room.clone();
            tokio::spawn(async move { service.join_room(&room, "Meera").await })
        };
        send(&service, &host, r#"{"type":"start_game","data":{}}"#).await;
        let joined = joiner.await.unwrap();

        let frames = host.drain(&service).await;
        let started_at = frames
            .iter()
            .position(|m| matches!(m, ServerMessage::GameState(v) if v.state == GamePhase::Playing))
            .expect("host saw the game start");
        let announced_at = frames
            .iter()
            .position(|m| matches!(m, ServerMessage::PlayerJoined { .. }));

        match joined {
            Ok(_) => assert!(announced_at.expect("join announced") < started_at),
            Err(e) => {
                assert_eq!(e.to_string(), "game already started");
                assert!(announced_at.is_none());
            }
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_selections_pass_hands_once() {
    let service = service();
    let (room, host_id) = service.create_room("P0").await;
    let mut ids = vec![host_id];
    for i in 1..5 {
        ids.push(service.join_room(&room, &format!("P{i}")).await.unwrap());
    }
    let mut clients = Vec::new();
    for id in &ids {
        clients.push(connect(&service, &room, id).await);
    }
    send(&service, &clients[0], r#"{"type":"start_game","data":{}}"#).await;

    let handle = service.registry().get(&room).await.unwrap();
    let hands_before: Vec<Vec<Card>> = {
        let game = handle.lock().await;
        ids.iter()
            .map(|id| game.player(id).unwrap().hand.clone())
            .collect()
    };

    let tasks: Vec<_> = clients
        .iter()
        .map(|client| {
            let service = service.clone();
            let session = client.session.clone();
            tokio::spawn(async move {
                service
                    .handle_command(&session, ClientMessage::SelectCard { card_index: 0 })
                    .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let game = handle.lock().await;
    assert_eq!(game.turn(), 2);
    let n = ids.len();
    for (seat, id) in ids.iter().enumerate() {
        let player = game.player(id).unwrap();
        assert_eq!(player.played, vec![hands_before[seat][0]]);
        assert!(!player.has_selected);
        // Each seat now holds the previous seat's remaining cards
        let from = (seat + n - 1) % n;
        assert_eq!(player.hand, hands_before[from][1..].to_vec());
    }
}

#[tokio::test]
async fn test_leave_closes_leavers_connections() {
    let service = service();
    let (room, mut host, mut guest) = two_player_room(&service).await;
    let third = service.join_room(&room, "Meera").await.unwrap();
    host.drain(&service).await;
    guest.drain(&service).await;

    service
        .leave_room(&room, &guest.session.player_id)
        .await
        .unwrap();
    service.join_room(&room, "Kiran").await.unwrap();

    assert!(guest.frames.recv().await.is_none());
    assert!(
        host.drain(&service)
            .await
            .iter()
            .any(|m| matches!(m, ServerMessage::PlayerJoined { .. }))
    );
    assert!(service.registry().get(&room).await.unwrap().lock().await.has_player(&third));
}

#[tokio::test]
async fn test_closed_room_drops_every_connection() {
    let service = service();
    let (room, host, mut guest) = two_player_room(&service).await;

    assert!(
        service
            .leave_room(&room, &host.session.player_id)
            .await
            .unwrap()
    );

    assert!(guest.frames.recv().await.is_none());
    assert_eq!(
        service.hub().connection_count(Some(room)).await.unwrap(),
        0
    );
}
