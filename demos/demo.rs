//! Demonstration consumer: handlers of all three shapes on named events,
//! driven through a few emissions. Waiting on each completion before the
//! next emission keeps the (otherwise unordered) output grouped per emit.

use std::io;

use evoke::{Emitter, Handler, Payload, Value};

fn message_payload() -> Payload {
    Payload::from(vec![
        Value::new("this is a message".to_string()),
        Value::new(io::Error::other("this is an error")),
    ])
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    tracing_subscriber::fmt::init();

    let emitter = Emitter::new();

    println!("on('hello', anonymous)");
    emitter.on(
        "hello",
        Handler::nullary(|| async {
            println!("call anonymous handler");
        }),
    );

    println!("on('hello', foo)");
    emitter.on(
        "hello",
        Handler::unary(|input: Value| async move {
            let message = input.expect_ref::<String>();
            println!("call foo -> {message}");
        }),
    );

    println!("once('hello', bar)");
    emitter.once(
        "hello",
        Handler::variadic(|input: Payload| async move {
            let message = input.first().expect("bar expects a message").expect_ref::<String>();
            let error = input.get(1).expect("bar expects an error").expect_ref::<io::Error>();
            println!("call bar -> {message} error: {error}");
        }),
    );

    println!("on('world', haz)");
    emitter.on(
        "world",
        Handler::unary(|input: Value| async move {
            let message = input.expect_ref::<String>();
            println!("call haz -> {message}");
        }),
    );

    println!("emit('hello')");
    emitter.emit("hello", message_payload()).wait().await;

    println!("emit('hello') again");
    emitter.emit("hello", message_payload()).wait().await;

    println!("emit('world')");
    emitter.emit("world", message_payload()).wait().await;

    println!("emit('whatever')");
    emitter.emit("whatever", message_payload()).wait().await;

    println!("events done");
}
