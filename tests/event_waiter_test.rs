mod common;

use std::{sync::Arc, time::Duration};

use herald::event::{Event, EventType, EventWaiter, Message, WaitError};
use pretty_assertions::assert_eq;

fn message(author: &str, content: &str) -> Event {
    Event::message_create(Message {
        id: format!("m-{}", author),
        channel_id: "c1".to_string(),
        author_id: author.to_string(),
        author_is_bot: false,
        content: content.to_string(),
    })
}

#[tokio::test]
async fn test_concurrent_waiters_each_receive_their_match() {
    let waiter = Arc::new(EventWaiter::new());
    let authors: Vec<String> = (0..16).map(|i| format!("user-{}", i)).collect();

    let mut handles = Vec::new();
    for author in &authors {
        let waiter = waiter.clone();
        let author = author.clone();
        handles.push(tokio::spawn(async move {
            let wanted = author.clone();
            let event = waiter
                .wait_for(EventType::MessageCreate, Duration::from_secs(2), move |e| {
                    e.as_message().is_some_and(|m| m.author_id == wanted)
                })
                .await?;
            Ok::<_, WaitError>((author, event))
        }));
    }

    let list = waiter.get(EventType::MessageCreate).unwrap().clone();
    let expected = authors.len();
    common::eventually(|| {
        let list = list.clone();
        async move { (list.len().await == expected).then_some(()) }
    })
    .await;

    for author in authors.iter().rev() {
        assert_eq!(waiter.dispatch(&message(author, "hi")).await, 1);
    }

    for handle in handles {
        let (author, event) = handle.await.unwrap().unwrap();
        assert_eq!(event.as_message().unwrap().author_id, author);
    }
    assert!(list.is_empty().await);
}

#[tokio::test]
async fn test_attached_source_routes_to_waiter() {
    let (platform, waiter) = common::attached_platform();

    let wait = tokio::spawn({
        let waiter = waiter.clone();
        async move {
            waiter
                .wait_for(EventType::MessageCreate, Duration::from_secs(2), |e| {
                    e.as_message().is_some_and(|m| m.content == "yes")
                })
                .await
        }
    });

    let list = waiter.get(EventType::MessageCreate).unwrap().clone();
    common::eventually(|| {
        let list = list.clone();
        async move { (!list.is_empty().await).then_some(()) }
    })
    .await;

    platform.say("c1", "alice", "no");
    platform.say("c1", "alice", "yes");

    let event = wait.await.unwrap().unwrap();
    assert_eq!(event.as_message().unwrap().content, "yes");
}
