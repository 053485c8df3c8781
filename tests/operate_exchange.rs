use std::time::Duration;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use switchmote::{
    BotAction, BotHandler, CurtainHandler, CurtainMode, DeviceSession, FakeDeviceLink,
    FakeLinkConfig, HumidifierHandler, HumidifierMode, InteractionError, OperateError,
    ProtocolError,
};

fn scripted_link(replies: Vec<Option<Vec<u8>>>) -> FakeDeviceLink {
    FakeDeviceLink::new(FakeLinkConfig::builder().replies(replies).build())
}

fn session_over(link: &FakeDeviceLink) -> DeviceSession {
    DeviceSession::new(Box::new(link.clone()))
}

#[tokio::test]
async fn operate_resolves_success_for_accepted_opcode() -> anyhow::Result<()> {
    let link = scripted_link(vec![Some(vec![0x01, 0x00, 0x00])]);
    let mut session = session_over(&link);

    BotHandler::press(&mut session).await?;

    assert_eq!(vec![vec![0x57, 0x01, 0x00]], link.written_commands());
    session.close().await?;
    Ok(())
}

#[tokio::test]
async fn operate_accepts_alternate_success_opcode() -> anyhow::Result<()> {
    let link = scripted_link(vec![Some(vec![0x05, 0x00, 0x00])]);
    let mut session = session_over(&link);

    BotHandler::turn_on(&mut session).await?;

    assert_eq!(vec![vec![0x57, 0x01, 0x01]], link.written_commands());
    Ok(())
}

#[tokio::test]
async fn operate_reports_unexpected_opcode_with_hex_payload() {
    let link = scripted_link(vec![Some(vec![0x02, 0x00, 0x00])]);
    let mut session = session_over(&link);

    let error = session
        .operate(&BotHandler::command_for(BotAction::Press))
        .await
        .expect_err("unrecognised opcode must fail the exchange");

    assert_matches!(
        error,
        OperateError::UnexpectedResponse { response_hex } if response_hex == "020000"
    );
}

#[tokio::test]
async fn operate_reports_wrong_response_length_as_protocol_failure() {
    let link = scripted_link(vec![Some(vec![0x01, 0x00, 0x00, 0x00])]);
    let mut session = session_over(&link);

    let error = session
        .operate(&BotHandler::command_for(BotAction::Press))
        .await
        .expect_err("over-long acknowledgement must fail the exchange");

    assert_matches!(
        error,
        OperateError::UnexpectedResponse { response_hex } if response_hex == "01000000"
    );
}

#[tokio::test(start_paused = true)]
async fn operate_times_out_when_no_notification_arrives() {
    let link = scripted_link(vec![None]);
    let mut session = session_over(&link).with_response_timeout(Duration::from_secs(3));

    let error = session
        .operate(&BotHandler::command_for(BotAction::Press))
        .await
        .expect_err("a silent device must produce a timeout outcome");

    assert_matches!(
        error,
        OperateError::Timeout { waited } if waited == Duration::from_secs(3)
    );
}

#[tokio::test(start_paused = true)]
async fn late_notification_is_not_attributed_to_a_later_exchange() {
    let link = scripted_link(vec![None, Some(vec![0x01, 0x00, 0x00])]);
    let mut session = session_over(&link);

    let first = session
        .operate(&BotHandler::command_for(BotAction::TurnOn))
        .await;
    assert_matches!(first, Err(OperateError::Timeout { .. }));

    // The timed-out exchange's answer arrives between calls; it must be
    // discarded, not delivered to the next exchange.
    link.inject_notification(vec![0x02, 0x00, 0x00]);

    session
        .operate(&BotHandler::command_for(BotAction::TurnOff))
        .await
        .expect("second exchange should resolve on its own scripted reply");

    assert_eq!(
        vec![vec![0x57, 0x01, 0x01], vec![0x57, 0x01, 0x02]],
        link.written_commands()
    );
}

#[tokio::test]
async fn write_failure_propagates_unchanged() {
    let link = FakeDeviceLink::new(
        FakeLinkConfig::builder()
            .replies(vec![])
            .reject_writes(true)
            .build(),
    );
    let mut session = session_over(&link);

    let error = session
        .operate(&BotHandler::command_for(BotAction::Press))
        .await
        .expect_err("a rejected write must fail the exchange");

    assert_matches!(
        error,
        OperateError::Transport(InteractionError::Ble(_))
    );
    assert_eq!(Vec::<Vec<u8>>::new(), link.written_commands());
}

#[tokio::test]
async fn humidifier_validation_rejects_before_any_byte_is_sent() {
    let link = scripted_link(vec![]);
    let mut session = session_over(&link);

    let error = HumidifierHandler::set_mode(&mut session, HumidifierMode::Manual(150))
        .await
        .expect_err("over-range manual target must be rejected");

    assert_matches!(error, ProtocolError::Validation(_));
    assert_eq!(Vec::<Vec<u8>>::new(), link.written_commands());
}

#[tokio::test]
async fn curtain_run_to_position_writes_exact_frame() -> anyhow::Result<()> {
    let link = scripted_link(vec![Some(vec![0x05, 0x00, 0x00])]);
    let mut session = session_over(&link);

    CurtainHandler::run_to_position(&mut session, 75, CurtainMode::Silent).await?;

    assert_eq!(
        vec![vec![0x57, 0x0F, 0x45, 0x01, 0x05, 0x01, 0x4B]],
        link.written_commands()
    );
    Ok(())
}
