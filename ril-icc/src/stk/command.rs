//! Proactive command parameters
//!
//! One builder per command type, picking the nodes it needs out of the
//! decoded COMPREHENSION-TLV list.

use super::{search_for_next_tag, search_for_tag, CommandType, StkError};
use crate::tlv::tags;
use crate::tlv::value::{CommandDetails, Duration, Item, ResponseLength};
use crate::tlv::{ComprehensionTLV, ComprehensionValue};

/// A decoded proactive command
#[derive(Debug, Clone, PartialEq)]
pub struct ProactiveCommand {
    pub details: CommandDetails,
    pub params: CommandParams,
}

/// DISPLAY TEXT, SET UP IDLE MODE TEXT, the SEND family and the channel
/// commands
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextMessage {
    pub text: Option<String>,
    pub is_high_priority: bool,
    pub user_clear: bool,
    pub response_needed: bool,
    pub duration: Option<Duration>,
}

/// SELECT ITEM and SET UP MENU
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Menu {
    pub title: Option<String>,
    /// A single `None` entry removes the current menu
    pub items: Vec<Option<Item>>,
    /// Identifier of the item selected by default
    pub default_item: Option<u8>,
    pub presentation_type: u8,
    pub is_help_available: bool,
    pub next_action_list: Option<Vec<u8>>,
}

/// GET INKEY and GET INPUT
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Input {
    pub text: Option<String>,
    pub default_text: Option<String>,
    pub min_length: u8,
    pub max_length: u8,
    pub duration: Option<Duration>,
    pub is_alphabet: bool,
    pub is_ucs2: bool,
    pub is_yes_no_requested: bool,
    pub hide_input: bool,
    pub is_packed: bool,
    pub is_help_available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SetUpCall {
    pub address: String,
    /// First alpha identifier, shown before the call is set up
    pub confirm_message: Option<String>,
    /// Second alpha identifier, shown while the call is set up
    pub call_message: Option<String>,
    pub duration: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Browser {
    /// Empty for the default URL
    pub url: String,
    pub mode: u8,
    pub confirm_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tone {
    pub text: Option<String>,
    pub tone: Option<u8>,
    pub duration: Option<Duration>,
    pub is_vibrate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timer {
    pub timer_action: u8,
    pub timer_id: u8,
    /// Seconds
    pub timer_value: Option<u32>,
}

/// Parameters of a proactive command, by command type
#[derive(Debug, Clone, PartialEq)]
pub enum CommandParams {
    Refresh { file_list: Option<String> },
    MoreTime,
    PollInterval(Duration),
    PollOff,
    /// `None` removes the current event list
    SetUpEventList { event_list: Option<Vec<u8>> },
    SetUpCall(SetUpCall),
    SendSs(TextMessage),
    SendUssd(TextMessage),
    SendSms(TextMessage),
    SendDtmf(TextMessage),
    LaunchBrowser(Browser),
    PlayTone(Tone),
    DisplayText(TextMessage),
    GetInkey(Input),
    GetInput(Input),
    SelectItem(Menu),
    SetUpMenu(Menu),
    ProvideLocalInfo { local_info_type: u8 },
    TimerManagement(Timer),
    SetUpIdleModeText(TextMessage),
    /// `None` for non-specific language notification
    LanguageNotification { language: Option<String> },
    OpenChannel(TextMessage),
    CloseChannel(TextMessage),
    ReceiveData(TextMessage),
    SendData(TextMessage),
    Unknown(u8),
}

fn missing(command: &'static str, value: &'static str) -> StkError {
    StkError::RequiredValueMissing { command, value }
}

fn value_of(tag: u8, nodes: &[ComprehensionTLV]) -> Option<&ComprehensionValue> {
    search_for_tag(tag, nodes).map(|node| &node.value)
}

fn alpha_id(node: Option<&ComprehensionTLV>) -> Option<String> {
    match node.map(|node| &node.value) {
        Some(ComprehensionValue::AlphaId(text)) => Some(text.clone()),
        _ => None,
    }
}

/// `Some(None)` for a null text string, `None` when the node is absent
fn text_string(tag: u8, nodes: &[ComprehensionTLV]) -> Option<Option<String>> {
    match value_of(tag, nodes) {
        Some(ComprehensionValue::TextString(text)) => Some(text.as_ref().map(|t| t.text.clone())),
        _ => None,
    }
}

fn duration(nodes: &[ComprehensionTLV]) -> Option<Duration> {
    match value_of(tags::DURATION, nodes) {
        Some(ComprehensionValue::Duration(duration)) => Some(*duration),
        _ => None,
    }
}

/// Build the parameters of one proactive command
pub fn create_param(details: &CommandDetails, nodes: &[ComprehensionTLV]) -> Result<CommandParams, StkError> {
    let Some(command_type) = CommandType::from_u8(details.type_of_command) else {
        return Ok(CommandParams::Unknown(details.type_of_command));
    };
    let qualifier = details.command_qualifier;

    let params = match command_type {
        CommandType::Refresh => CommandParams::Refresh {
            file_list: match value_of(tags::FILE_LIST, nodes) {
                Some(ComprehensionValue::FileList(list)) => Some(list.file_list()),
                _ => None,
            },
        },
        CommandType::MoreTime => CommandParams::MoreTime,
        CommandType::PollInterval => match duration(nodes) {
            Some(duration) => CommandParams::PollInterval(duration),
            None => return Err(missing("Poll Interval", "Duration")),
        },
        CommandType::PollOff => CommandParams::PollOff,
        CommandType::SetUpEventList => match value_of(tags::EVENT_LIST, nodes) {
            Some(ComprehensionValue::EventList(list)) => CommandParams::SetUpEventList {
                event_list: list.clone(),
            },
            _ => return Err(missing("Event List", "Event List")),
        },
        CommandType::SetUpCall => CommandParams::SetUpCall(set_up_call(nodes)?),
        CommandType::SendSs => CommandParams::SendSs(event_notify(nodes)?),
        CommandType::SendUssd => CommandParams::SendUssd(event_notify(nodes)?),
        CommandType::SendSms => CommandParams::SendSms(event_notify(nodes)?),
        CommandType::SendDtmf => CommandParams::SendDtmf(event_notify(nodes)?),
        CommandType::LaunchBrowser => {
            let url = match value_of(tags::URL, nodes) {
                Some(ComprehensionValue::Url(url)) => url.clone(),
                _ => return Err(missing("Launch Browser", "URL")),
            };
            CommandParams::LaunchBrowser(Browser {
                url,
                mode: qualifier & 0x03,
                confirm_message: alpha_id(search_for_tag(tags::ALPHA_ID, nodes)),
            })
        }
        CommandType::PlayTone => CommandParams::PlayTone(Tone {
            text: alpha_id(search_for_tag(tags::ALPHA_ID, nodes)),
            tone: match value_of(tags::TONE, nodes) {
                Some(ComprehensionValue::Tone(tone)) => Some(*tone),
                _ => None,
            },
            duration: duration(nodes),
            is_vibrate: qualifier & 0x01 != 0,
        }),
        CommandType::DisplayText => {
            let text = text_string(tags::TEXT_STRING, nodes).ok_or_else(|| missing("Display Text", "Text String"))?;
            CommandParams::DisplayText(TextMessage {
                text,
                is_high_priority: qualifier & 0x01 != 0,
                user_clear: qualifier & 0x80 != 0,
                response_needed: search_for_tag(tags::IMMEDIATE_RESPONSE, nodes).is_some(),
                duration: duration(nodes),
            })
        }
        CommandType::SetUpIdleModeText => {
            let text = text_string(tags::TEXT_STRING, nodes)
                .ok_or_else(|| missing("Set Up Idle Text", "Text String"))?;
            CommandParams::SetUpIdleModeText(TextMessage {
                text,
                ..TextMessage::default()
            })
        }
        CommandType::GetInkey => {
            let text = text_string(tags::TEXT_STRING, nodes).ok_or_else(|| missing("Get InKey", "Text String"))?;
            CommandParams::GetInkey(Input {
                text,
                min_length: 1,
                max_length: 1,
                duration: duration(nodes),
                is_alphabet: qualifier & 0x01 != 0,
                is_ucs2: qualifier & 0x02 != 0,
                // Bits 1 and 2 are ignored when a yes/no answer is requested
                is_yes_no_requested: qualifier & 0x04 != 0,
                is_help_available: qualifier & 0x80 != 0,
                ..Input::default()
            })
        }
        CommandType::GetInput => {
            let text = text_string(tags::TEXT_STRING, nodes).ok_or_else(|| missing("Get Input", "Text String"))?;
            let ResponseLength { min_length, max_length } = match value_of(tags::RESPONSE_LENGTH, nodes) {
                Some(ComprehensionValue::ResponseLength(length)) => *length,
                _ => return Err(missing("Get Input", "Response Length")),
            };
            CommandParams::GetInput(Input {
                text,
                default_text: text_string(tags::DEFAULT_TEXT, nodes).flatten(),
                min_length,
                max_length,
                duration: duration(nodes),
                is_alphabet: qualifier & 0x01 != 0,
                is_ucs2: qualifier & 0x02 != 0,
                hide_input: qualifier & 0x04 != 0,
                is_packed: qualifier & 0x08 != 0,
                is_help_available: qualifier & 0x80 != 0,
                ..Input::default()
            })
        }
        CommandType::SelectItem => CommandParams::SelectItem(menu(qualifier, nodes)?),
        CommandType::SetUpMenu => CommandParams::SetUpMenu(menu(qualifier, nodes)?),
        CommandType::ProvideLocalInfo => CommandParams::ProvideLocalInfo {
            local_info_type: qualifier,
        },
        CommandType::TimerManagement => {
            let timer_id = match value_of(tags::TIMER_IDENTIFIER, nodes) {
                Some(ComprehensionValue::TimerId(id)) => *id,
                _ => return Err(missing("Timer Management", "Timer Identifier")),
            };
            CommandParams::TimerManagement(Timer {
                timer_action: qualifier,
                timer_id,
                timer_value: match value_of(tags::TIMER_VALUE, nodes) {
                    Some(ComprehensionValue::TimerValue(seconds)) => Some(*seconds),
                    _ => None,
                },
            })
        }
        CommandType::LanguageNotification => CommandParams::LanguageNotification {
            language: match value_of(tags::LANGUAGE, nodes) {
                Some(ComprehensionValue::Language(language)) => Some(language.clone()),
                _ => None,
            },
        },
        CommandType::OpenChannel => CommandParams::OpenChannel(bip_message(nodes)),
        CommandType::CloseChannel => CommandParams::CloseChannel(bip_message(nodes)),
        CommandType::ReceiveData => CommandParams::ReceiveData(bip_message(nodes)),
        CommandType::SendData => CommandParams::SendData(bip_message(nodes)),
    };
    Ok(params)
}

fn set_up_call(nodes: &[ComprehensionTLV]) -> Result<SetUpCall, StkError> {
    let mut iter = nodes.iter();
    let confirm_message = alpha_id(search_for_next_tag(tags::ALPHA_ID, &mut iter));
    let call_message = alpha_id(search_for_next_tag(tags::ALPHA_ID, &mut iter));

    let address = match value_of(tags::ADDRESS, nodes) {
        Some(ComprehensionValue::Address(address)) => address.number.clone(),
        _ => return Err(missing("Set Up Call", "Address")),
    };
    Ok(SetUpCall {
        address,
        confirm_message,
        call_message,
        duration: duration(nodes),
    })
}

fn event_notify(nodes: &[ComprehensionTLV]) -> Result<TextMessage, StkError> {
    let text = alpha_id(search_for_tag(tags::ALPHA_ID, nodes)).ok_or_else(|| missing("Event Notify", "Alpha ID"))?;
    Ok(TextMessage {
        text: Some(text),
        ..TextMessage::default()
    })
}

fn bip_message(nodes: &[ComprehensionTLV]) -> TextMessage {
    TextMessage {
        text: alpha_id(search_for_tag(tags::ALPHA_ID, nodes)),
        ..TextMessage::default()
    }
}

fn menu(qualifier: u8, nodes: &[ComprehensionTLV]) -> Result<Menu, StkError> {
    let items: Vec<Option<Item>> = nodes
        .iter()
        .filter_map(|node| match (&node.value, node.tag_id()) {
            (ComprehensionValue::Item(item), Some(tags::ITEM)) => Some(item.clone()),
            _ => None,
        })
        .collect();
    if items.is_empty() {
        return Err(missing("Stk Menu", "items"));
    }

    Ok(Menu {
        title: alpha_id(search_for_tag(tags::ALPHA_ID, nodes)),
        items,
        default_item: match value_of(tags::ITEM_ID, nodes) {
            Some(ComprehensionValue::ItemId(id)) => Some(*id),
            _ => None,
        },
        presentation_type: qualifier & 0x03,
        is_help_available: qualifier & 0x80 != 0,
        next_action_list: match value_of(tags::NEXT_ACTION_IND, nodes) {
            Some(ComprehensionValue::NextActionIndicator(list)) => Some(list.clone()),
            _ => None,
        },
    })
}
