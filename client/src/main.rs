use clap::Parser;
use client::input::{InputManager, PlayerAction};
use client::interpolation::SnapshotBuffer;
use client::network::{ClientRuntime, NetEvent};
use client::rendering::Renderer;
use log::{info, warn};
use macroquad::prelude::*;
use shared::{ClientMessage, InputEvent, ServerMessage};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server websocket URL to connect to
    #[arg(short = 's', long, default_value = "ws://127.0.0.1:8080")]
    server: String,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Snake Duel".to_string(),
        window_width: 850,
        window_height: 650,
        window_resizable: false,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    let args = Args::parse();
    info!("connecting to {}", args.server);
    info!("controls: arrows or WASD to steer, R for a new round, Esc to quit");

    let runtime = ClientRuntime::connect(args.server.clone());
    let mut buffer = SnapshotBuffer::new();
    let mut input = InputManager::new();
    let renderer = Renderer::new();
    let mut player: Option<u8> = None;

    loop {
        while let Some(event) = runtime.try_recv() {
            match event {
                NetEvent::Message(ServerMessage::Welcome { player: slot }) => {
                    info!("joined as player {}", slot);
                    player = Some(slot);
                    input.set_player(slot);
                }
                NetEvent::Message(ServerMessage::Full) => {
                    warn!("server is full");
                    return;
                }
                NetEvent::Message(ServerMessage::State { data }) => {
                    buffer.push(data, Instant::now());
                }
                NetEvent::Closed => {
                    warn!("connection closed");
                    return;
                }
            }
        }

        match input.poll() {
            Some(PlayerAction::Quit) => break,
            Some(PlayerAction::NewRound) => runtime.send(ClientMessage::Reset),
            Some(PlayerAction::Steer(direction)) => runtime.send(ClientMessage::Input {
                data: InputEvent {
                    key: direction.token().to_string(),
                },
            }),
            None => {}
        }

        match buffer.view(Instant::now()) {
            Some(scene) => renderer.render(&scene, player),
            None => renderer.render_waiting(&args.server),
        }

        next_frame().await;
    }
}
