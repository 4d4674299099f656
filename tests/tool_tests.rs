//! Executor behavior against a recording desktop.

mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;

use common::RecordingDesktop;
use desktop_pilot::desktop::{DesktopAction, Point, ScrollDirection};
use desktop_pilot::tools::bash::NO_OUTPUT_SENTINEL;
use desktop_pilot::tools::{
    BashTool, ComputerAction, ComputerTool, Tool, ToolArguments, ToolExecutionContext,
};
use desktop_pilot::types::ToolPayload;

async fn computer(desktop: &Arc<RecordingDesktop>, args: serde_json::Value) -> ToolPayload {
    ComputerTool::new(desktop.clone())
        .execute(&ToolArguments::new(args), &ToolExecutionContext::default())
        .await
        .expect("computer action succeeds")
}

#[tokio::test(start_paused = true)]
async fn wait_is_clamped_to_two_seconds() {
    let desktop = Arc::new(RecordingDesktop::new());
    let started = tokio::time::Instant::now();

    let payload = computer(&desktop, json!({ "action": "wait", "duration": 10 })).await;

    assert!(started.elapsed() <= Duration::from_secs(2));
    assert_eq!(payload, ToolPayload::text("Waited for 2 seconds"));
    assert!(desktop.actions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn short_wait_is_honored() {
    let desktop = Arc::new(RecordingDesktop::new());
    let payload = ComputerTool::new(desktop)
        .run(ComputerAction::Wait { seconds: 0.5 })
        .await
        .unwrap();
    assert_eq!(payload, ToolPayload::text("Waited for 0.5 seconds"));
}

#[tokio::test]
async fn return_key_presses_enter() {
    let desktop = Arc::new(RecordingDesktop::new());
    let payload = computer(&desktop, json!({ "action": "key", "text": "Return" })).await;

    assert_eq!(payload, ToolPayload::text("Pressed key: Return"));
    assert_eq!(desktop.actions(), vec![DesktopAction::Press("enter".into())]);
}

#[tokio::test]
async fn clicks_move_first() {
    let desktop = Arc::new(RecordingDesktop::new());
    let payload = computer(
        &desktop,
        json!({ "action": "double_click", "coordinate": [10, 20] }),
    )
    .await;

    assert_eq!(payload, ToolPayload::text("Double clicked at 10, 20"));
    assert_eq!(
        desktop.actions(),
        vec![
            DesktopAction::MoveMouse(Point::new(10, 20)),
            DesktopAction::DoubleClick,
        ]
    );
}

#[tokio::test]
async fn scroll_type_and_drag_report_what_they_did() {
    let desktop = Arc::new(RecordingDesktop::new());

    assert_eq!(
        computer(
            &desktop,
            json!({ "action": "scroll", "scroll_direction": "down", "scroll_amount": 3 })
        )
        .await,
        ToolPayload::text("Scrolled down by 3")
    );
    assert_eq!(
        computer(&desktop, json!({ "action": "type", "text": "hello world" })).await,
        ToolPayload::text("Typed: hello world")
    );
    assert_eq!(
        computer(
            &desktop,
            json!({ "action": "left_click_drag", "start_coordinate": [1, 2], "coordinate": [3, 4] })
        )
        .await,
        ToolPayload::text("Dragged mouse from 1, 2 to 3, 4")
    );
    assert_eq!(
        desktop.actions(),
        vec![
            DesktopAction::Scroll {
                direction: ScrollDirection::Down,
                amount: 3
            },
            DesktopAction::Write("hello world".into()),
            DesktopAction::Drag {
                from: Point::new(1, 2),
                to: Point::new(3, 4)
            },
        ]
    );
}

#[tokio::test]
async fn screenshot_is_base64_png() {
    let desktop = Arc::new(RecordingDesktop::new());
    let payload = computer(&desktop, json!({ "action": "screenshot" })).await;
    assert_eq!(
        payload,
        ToolPayload::Image {
            data: "iVBORw==".into(),
            mime_type: "image/png".into()
        }
    );
}

#[tokio::test]
async fn missing_coordinate_fails_without_side_effects() {
    let desktop = Arc::new(RecordingDesktop::new());
    let err = ComputerTool::new(desktop.clone())
        .execute(
            &ToolArguments::new(json!({ "action": "left_click" })),
            &ToolExecutionContext::default(),
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Coordinate required for left click action"));
    assert!(desktop.actions().is_empty());
}

#[tokio::test]
async fn bash_returns_stdout_verbatim() {
    let desktop = Arc::new(RecordingDesktop::new().with_stdout("a.txt\nb.txt\n"));
    let payload = BashTool::new(desktop.clone()).run("ls").await.unwrap();
    assert_eq!(payload, ToolPayload::text("a.txt\nb.txt\n"));
    assert_eq!(desktop.actions(), vec![DesktopAction::RunCommand("ls".into())]);
}

#[tokio::test]
async fn bash_without_output_reports_success() {
    let desktop = Arc::new(RecordingDesktop::new());
    let payload = BashTool::new(desktop).run("mkdir -p /tmp/x").await.unwrap();
    assert_eq!(payload, ToolPayload::text(NO_OUTPUT_SENTINEL));
}

#[tokio::test]
async fn bash_failure_message_is_for_the_model() {
    let desktop = Arc::new(RecordingDesktop::new().with_failing_commands());
    let err = BashTool::new(desktop).run("nosuchcmd").await.unwrap_err();
    match err {
        desktop_pilot::error::PilotError::ToolExecution { tool_name, message } => {
            assert_eq!(tool_name, "bash");
            assert!(message.starts_with("Error executing command: "));
            assert!(message.contains("status 127"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
