//! Win32 backend: a hidden message-only window receives clipboard and tray
//! messages, and each notification is a short-lived layered popup.

use std::cell::RefCell;
use std::ffi::c_void;
use std::mem;
use std::ptr;
use std::time::Duration;

use log::{debug, error, info, warn};
use windows_sys::Win32::Foundation::{
    GetLastError, HINSTANCE, HWND, LPARAM, LRESULT, POINT, RECT, WPARAM,
};
use windows_sys::Win32::Graphics::Gdi::{
    BeginPaint, CreateFontW, DeleteObject, DrawTextW, EndPaint, GetStockObject, SelectObject,
    SetBkMode, SetTextColor, UpdateWindow, ANSI_CHARSET, CLEARTYPE_QUALITY, CLIP_DEFAULT_PRECIS,
    DEFAULT_PITCH, DKGRAY_BRUSH, DT_LEFT, DT_WORDBREAK, FF_DONTCARE, FW_NORMAL, HFONT,
    OUT_DEFAULT_PRECIS, PAINTSTRUCT, TRANSPARENT,
};
use windows_sys::Win32::Media::Audio::{PlaySoundW, SND_ALIAS, SND_ASYNC};
use windows_sys::Win32::System::DataExchange::{
    AddClipboardFormatListener, CloseClipboard, GetClipboardData, OpenClipboard,
    RemoveClipboardFormatListener,
};
use windows_sys::Win32::System::LibraryLoader::GetModuleHandleW;
use windows_sys::Win32::System::Memory::{GlobalLock, GlobalUnlock};
use windows_sys::Win32::System::Ole::CF_UNICODETEXT;
use windows_sys::Win32::UI::Shell::{
    Shell_NotifyIconW, NIF_ICON, NIF_INFO, NIF_MESSAGE, NIF_TIP, NIIF_INFO, NIM_ADD, NIM_DELETE,
    NIM_MODIFY, NOTIFYICONDATAW,
};
use windows_sys::Win32::UI::WindowsAndMessaging::{
    AppendMenuW, CreatePopupMenu, CreateWindowExW, DefWindowProcW, DestroyMenu, DestroyWindow,
    DispatchMessageW, GetClientRect, GetCursorPos, GetMessageW, GetWindowTextW, IsWindow,
    KillTimer, LoadIconW, MessageBoxW, PostMessageW, PostQuitMessage, RegisterClassW,
    SetForegroundWindow, SetLayeredWindowAttributes, SetTimer, ShowWindow, SystemParametersInfoW,
    TrackPopupMenu, TranslateMessage, CREATESTRUCTW, CW_USEDEFAULT, GWLP_USERDATA, HMENU,
    HWND_MESSAGE, IDI_APPLICATION, LWA_ALPHA, MB_ICONERROR, MB_OK, MF_STRING, MSG,
    SPI_GETWORKAREA, SW_SHOWNA, TPM_RIGHTBUTTON, WM_CLIPBOARDUPDATE, WM_COMMAND, WM_CREATE,
    WM_DESTROY, WM_NCDESTROY, WM_NULL, WM_PAINT, WM_RBUTTONUP, WM_TIMER, WM_USER, WNDCLASSW,
    WS_EX_LAYERED, WS_EX_TOOLWINDOW, WS_EX_TOPMOST, WS_OVERLAPPED, WS_POPUP,
};

use crate::app::{App, Effect, Event, Platform};
use crate::clipboard::{ClipboardProbe, ClipboardSource};
use crate::config::Config;
use crate::error::StartupError;
use crate::notification::{self, Popup, Rect, Surface, SurfaceAction, SurfaceEvent};
use crate::tray::{Balloon, MenuItem, TrayIcon, TrayMessage};
use crate::wide::{self, to_wide};

/// Callback message the shell sends for tray icon interaction.
const WM_TRAYICON: u32 = WM_USER + 1;

const MAIN_CLASS: &str = "ClipboardMonitorClass";
const SURFACE_CLASS: &str = "ClipboardNotificationClass";

const TEXT_COLOR: u32 = 0x00FF_FFFF;
const MAX_CAPTION: usize = 256;

#[cfg(target_pointer_width = "64")]
unsafe fn user_data(hwnd: HWND) -> isize {
    windows_sys::Win32::UI::WindowsAndMessaging::GetWindowLongPtrW(hwnd, GWLP_USERDATA)
}

#[cfg(target_pointer_width = "64")]
unsafe fn set_user_data(hwnd: HWND, value: isize) {
    windows_sys::Win32::UI::WindowsAndMessaging::SetWindowLongPtrW(hwnd, GWLP_USERDATA, value);
}

#[cfg(target_pointer_width = "32")]
unsafe fn user_data(hwnd: HWND) -> isize {
    windows_sys::Win32::UI::WindowsAndMessaging::GetWindowLongW(hwnd, GWLP_USERDATA) as isize
}

#[cfg(target_pointer_width = "32")]
unsafe fn set_user_data(hwnd: HWND, value: isize) {
    windows_sys::Win32::UI::WindowsAndMessaging::SetWindowLongW(hwnd, GWLP_USERDATA, value as i32);
}

fn last_error() -> u32 {
    unsafe { GetLastError() }
}

fn from_win32(rect: RECT) -> Rect {
    Rect {
        left: rect.left,
        top: rect.top,
        right: rect.right,
        bottom: rect.bottom,
    }
}

fn to_win32(rect: Rect) -> RECT {
    RECT {
        left: rect.left,
        top: rect.top,
        right: rect.right,
        bottom: rect.bottom,
    }
}

/// Map a main-window message to an application event. `None` means the
/// message goes to the default window procedure.
fn translate(msg: u32, wparam: WPARAM, lparam: LPARAM) -> Option<Event> {
    match msg {
        WM_CLIPBOARDUPDATE => Some(Event::ClipboardUpdate),
        WM_TRAYICON => Some(Event::Tray(match (lparam & 0xFFFF) as u32 {
            WM_RBUTTONUP => TrayMessage::RightButtonUp,
            other => TrayMessage::Other(other),
        })),
        WM_COMMAND => Some(Event::Command((wparam & 0xFFFF) as u16)),
        WM_DESTROY => Some(Event::Destroy),
        _ => None,
    }
}

fn icon_data(hwnd: HWND, id: u32) -> NOTIFYICONDATAW {
    let mut nid: NOTIFYICONDATAW = unsafe { mem::zeroed() };
    nid.cbSize = mem::size_of::<NOTIFYICONDATAW>() as u32;
    nid.hWnd = hwnd;
    nid.uID = id;
    nid
}

/// `NOTIFYICONDATAW` is packed on x86, so its text fields are assigned whole
/// instead of being filled through a reference.
fn balloon_data(hwnd: HWND, id: u32, balloon: &Balloon) -> NOTIFYICONDATAW {
    let mut nid = icon_data(hwnd, id);
    nid.uFlags = NIF_INFO;
    nid.szInfo = wide::filled(&balloon.body);
    nid.szInfoTitle = wide::filled(&balloon.title);
    nid.dwInfoFlags = NIIF_INFO;
    nid
}

/// Keeps the clipboard open for as long as it lives.
struct OpenClipboardGuard;

impl Drop for OpenClipboardGuard {
    fn drop(&mut self) {
        unsafe {
            CloseClipboard();
        }
    }
}

struct Win32Clipboard {
    owner: HWND,
}

impl ClipboardSource for Win32Clipboard {
    fn probe(&mut self) -> ClipboardProbe {
        if unsafe { OpenClipboard(self.owner) } == 0 {
            return ClipboardProbe::Busy;
        }
        let _guard = OpenClipboardGuard;

        let data = unsafe { GetClipboardData(CF_UNICODETEXT as u32) };
        if data.is_null() {
            return ClipboardProbe::NoText;
        }
        let text = unsafe { GlobalLock(data) };
        if text.is_null() {
            return ClipboardProbe::NoText;
        }
        unsafe {
            GlobalUnlock(data);
        }
        ClipboardProbe::Text
    }
}

/// Handed to each notification window through `lpCreateParams`.
struct SurfaceParams {
    font: HFONT,
    padding: i32,
    timeout: Duration,
}

/// Per-window state of a notification, stored in its user data.
struct SurfaceWindow {
    surface: Surface,
    font: HFONT,
    padding: i32,
}

unsafe fn paint_caption(hwnd: HWND, font: HFONT, padding: i32) {
    let mut ps: PAINTSTRUCT = mem::zeroed();
    let hdc = BeginPaint(hwnd, &mut ps);

    SetBkMode(hdc, TRANSPARENT as _);
    SetTextColor(hdc, TEXT_COLOR);
    if !font.is_null() {
        SelectObject(hdc, font);
    }

    let mut text = [0u16; MAX_CAPTION];
    let len = GetWindowTextW(hwnd, text.as_mut_ptr(), MAX_CAPTION as i32);

    let mut client: RECT = mem::zeroed();
    GetClientRect(hwnd, &mut client);
    let mut rc = to_win32(notification::text_rect(from_win32(client), padding));

    DrawTextW(hdc, text.as_mut_ptr(), len, &mut rc, DT_LEFT | DT_WORDBREAK);

    EndPaint(hwnd, &ps);
}

unsafe extern "system" fn surface_window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let event = match msg {
        WM_CREATE => {
            let create = &*(lparam as *const CREATESTRUCTW);
            let params = &*(create.lpCreateParams as *const SurfaceParams);
            let window = Box::new(SurfaceWindow {
                surface: Surface::new(params.timeout),
                font: params.font,
                padding: params.padding,
            });
            set_user_data(hwnd, Box::into_raw(window) as isize);
            SurfaceEvent::Created
        }
        WM_PAINT => SurfaceEvent::Paint,
        WM_TIMER => SurfaceEvent::Timer(wparam),
        WM_NCDESTROY => {
            let window = user_data(hwnd) as *mut SurfaceWindow;
            if !window.is_null() {
                set_user_data(hwnd, 0);
                drop(Box::from_raw(window));
            }
            return DefWindowProcW(hwnd, msg, wparam, lparam);
        }
        _ => return DefWindowProcW(hwnd, msg, wparam, lparam),
    };

    let Some(window) = (user_data(hwnd) as *mut SurfaceWindow).as_mut() else {
        return DefWindowProcW(hwnd, msg, wparam, lparam);
    };
    let action = window.surface.on_event(event);
    let (font, padding) = (window.font, window.padding);

    // `window` is freed by WM_NCDESTROY inside DestroyWindow below.
    match action {
        SurfaceAction::StartTimer { id, after } => {
            SetTimer(hwnd, id, after.as_millis() as u32, None);
        }
        SurfaceAction::Paint => paint_caption(hwnd, font, padding),
        SurfaceAction::Destroy { timer_id } => {
            KillTimer(hwnd, timer_id);
            DestroyWindow(hwnd);
        }
        SurfaceAction::Ignore => return DefWindowProcW(hwnd, msg, wparam, lparam),
    }
    0
}

/// OS handles needed to carry out effects. Only ever borrowed shared, so the
/// modal menu loop and `DestroyWindow` may safely re-enter the window proc.
struct Shell {
    hwnd: HWND,
    instance: HINSTANCE,
    menu: HMENU,
    icon_id: Option<u32>,
    surface: SurfaceParams,
    opacity: u8,
    sound: Vec<u16>,
}

impl Shell {
    fn apply(&self, effect: Effect) {
        match effect {
            Effect::ShowBalloon(balloon) => self.show_balloon(&balloon),
            Effect::ShowPopup(popup) => self.show_popup(&popup),
            Effect::ShowMenu => self.show_menu(),
            Effect::DestroyMainWindow => unsafe {
                DestroyWindow(self.hwnd);
            },
            Effect::Quit(code) => unsafe { PostQuitMessage(code) },
        }
    }

    fn show_balloon(&self, balloon: &Balloon) {
        let Some(id) = self.icon_id else {
            return;
        };
        let nid = balloon_data(self.hwnd, id, balloon);
        if unsafe { Shell_NotifyIconW(NIM_MODIFY, &nid) } == 0 {
            debug!("Balloon notification was rejected by the shell");
        }
    }

    fn show_popup(&self, popup: &Popup) {
        let mut work: RECT = unsafe { mem::zeroed() };
        let ok = unsafe {
            SystemParametersInfoW(SPI_GETWORKAREA, 0, &mut work as *mut RECT as *mut c_void, 0)
        };
        if ok == 0 {
            warn!("Could not query work area (os error {})", last_error());
            return;
        }
        let bounds = popup.bounds(from_win32(work));

        let class = to_wide(SURFACE_CLASS);
        let text = to_wide(&popup.text);
        let hwnd = unsafe {
            CreateWindowExW(
                WS_EX_TOPMOST | WS_EX_TOOLWINDOW | WS_EX_LAYERED,
                class.as_ptr(),
                text.as_ptr(),
                WS_POPUP,
                bounds.left,
                bounds.top,
                bounds.width(),
                bounds.height(),
                ptr::null_mut(),
                ptr::null_mut(),
                self.instance,
                &self.surface as *const SurfaceParams as *const c_void,
            )
        };
        if hwnd.is_null() {
            warn!("Failed to create notification window (os error {})", last_error());
            return;
        }

        unsafe {
            SetLayeredWindowAttributes(hwnd, 0, self.opacity, LWA_ALPHA);
            ShowWindow(hwnd, SW_SHOWNA);
            UpdateWindow(hwnd);
            PlaySoundW(self.sound.as_ptr(), ptr::null_mut(), SND_ALIAS | SND_ASYNC);
        }
    }

    fn show_menu(&self) {
        let mut pt = POINT { x: 0, y: 0 };
        unsafe {
            GetCursorPos(&mut pt);
            SetForegroundWindow(self.hwnd);
            TrackPopupMenu(self.menu, TPM_RIGHTBUTTON, pt.x, pt.y, 0, self.hwnd, ptr::null());
            // Lets the menu close properly when focus moves elsewhere.
            PostMessageW(self.hwnd, WM_NULL, 0, 0);
        }
    }
}

struct Context {
    app: RefCell<App>,
    shell: Shell,
}

unsafe extern "system" fn main_window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let Some(context) = (user_data(hwnd) as *const Context).as_ref() else {
        return DefWindowProcW(hwnd, msg, wparam, lparam);
    };
    let Some(event) = translate(msg, wparam, lparam) else {
        return DefWindowProcW(hwnd, msg, wparam, lparam);
    };

    let effects = match context.app.try_borrow_mut() {
        Ok(mut app) => app.handle(event, &mut Win32Clipboard { owner: hwnd }),
        Err(_) => {
            debug!("Dropping re-entrant {event:?}");
            return DefWindowProcW(hwnd, msg, wparam, lparam);
        }
    };
    for effect in effects {
        context.shell.apply(effect);
    }
    0
}

pub struct Win32Platform {
    config: Config,
    instance: HINSTANCE,
    hwnd: HWND,
    font: HFONT,
    menu: HMENU,
    icon_id: Option<u32>,
    listening: bool,
}

impl Win32Platform {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            instance: unsafe { GetModuleHandleW(ptr::null()) },
            hwnd: ptr::null_mut(),
            font: ptr::null_mut(),
            menu: ptr::null_mut(),
            icon_id: None,
            listening: false,
        }
    }

    fn register_class(
        &self,
        name: &str,
        proc: unsafe extern "system" fn(HWND, u32, WPARAM, LPARAM) -> LRESULT,
        background: bool,
    ) -> Result<(), StartupError> {
        let class_name = to_wide(name);
        let mut wc: WNDCLASSW = unsafe { mem::zeroed() };
        wc.lpfnWndProc = Some(proc);
        wc.hInstance = self.instance;
        wc.lpszClassName = class_name.as_ptr();
        if background {
            wc.hbrBackground = unsafe { GetStockObject(DKGRAY_BRUSH) };
        }

        if unsafe { RegisterClassW(&wc) } == 0 {
            return Err(StartupError::RegisterClass {
                os_error: last_error(),
            });
        }
        Ok(())
    }

    fn create_font(&self) -> HFONT {
        let face = to_wide(&self.config.font_face);
        unsafe {
            CreateFontW(
                self.config.font_height,
                0,
                0,
                0,
                FW_NORMAL as i32,
                0,
                0,
                0,
                ANSI_CHARSET as _,
                OUT_DEFAULT_PRECIS as _,
                CLIP_DEFAULT_PRECIS as _,
                CLEARTYPE_QUALITY as _,
                (DEFAULT_PITCH as u32 | FF_DONTCARE as u32) as _,
                face.as_ptr(),
            )
        }
    }
}

impl Platform for Win32Platform {
    fn register_window_classes(&mut self) -> Result<(), StartupError> {
        self.register_class(MAIN_CLASS, main_window_proc, false)?;
        self.register_class(SURFACE_CLASS, surface_window_proc, true)?;
        debug!("Registered window classes");
        Ok(())
    }

    fn create_main_window(&mut self) -> Result<(), StartupError> {
        let class = to_wide(MAIN_CLASS);
        let title = to_wide(&self.config.app_name);
        let hwnd = unsafe {
            CreateWindowExW(
                0,
                class.as_ptr(),
                title.as_ptr(),
                WS_OVERLAPPED,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                0,
                0,
                HWND_MESSAGE,
                ptr::null_mut(),
                self.instance,
                ptr::null(),
            )
        };
        if hwnd.is_null() {
            return Err(StartupError::CreateWindow {
                os_error: last_error(),
            });
        }
        self.hwnd = hwnd;

        self.font = self.create_font();
        if self.font.is_null() {
            warn!("Failed to create notification font, using the system font");
        }
        Ok(())
    }

    fn install_tray(&mut self, icon: &TrayIcon, menu: &[MenuItem]) {
        unsafe {
            self.menu = CreatePopupMenu();
            for item in menu {
                let label = to_wide(&item.label);
                AppendMenuW(self.menu, MF_STRING, item.action.id() as usize, label.as_ptr());
            }

            let mut nid = icon_data(self.hwnd, icon.id);
            nid.uFlags = NIF_ICON | NIF_TIP | NIF_MESSAGE;
            nid.uCallbackMessage = WM_TRAYICON;
            nid.hIcon = LoadIconW(ptr::null_mut(), IDI_APPLICATION);
            nid.szTip = wide::filled(&icon.tooltip);

            if Shell_NotifyIconW(NIM_ADD, &nid) == 0 {
                warn!("Failed to add tray icon");
            } else {
                self.icon_id = Some(icon.id);
                info!("Tray icon installed");
            }
        }
    }

    fn add_clipboard_listener(&mut self) -> Result<(), StartupError> {
        if unsafe { AddClipboardFormatListener(self.hwnd) } == 0 {
            return Err(StartupError::ClipboardListener {
                os_error: last_error(),
            });
        }
        self.listening = true;
        Ok(())
    }

    fn show_error(&mut self, err: &StartupError) {
        let text = to_wide(&err.to_string());
        let caption = to_wide("Error");
        unsafe {
            MessageBoxW(ptr::null_mut(), text.as_ptr(), caption.as_ptr(), MB_OK | MB_ICONERROR);
        }
    }

    fn run_loop(&mut self, app: App) -> i32 {
        let context = Box::new(Context {
            app: RefCell::new(app),
            shell: Shell {
                hwnd: self.hwnd,
                instance: self.instance,
                menu: self.menu,
                icon_id: self.icon_id,
                surface: SurfaceParams {
                    font: self.font,
                    padding: self.config.popup_padding,
                    timeout: self.config.popup_timeout(),
                },
                opacity: self.config.popup_opacity,
                sound: to_wide(&self.config.sound_alias),
            },
        });
        let context = Box::into_raw(context);
        unsafe { set_user_data(self.hwnd, context as isize) };

        let mut msg: MSG = unsafe { mem::zeroed() };
        let code = loop {
            match unsafe { GetMessageW(&mut msg, ptr::null_mut(), 0, 0) } {
                0 => break msg.wParam as i32,
                -1 => {
                    error!("Message loop failed (os error {})", last_error());
                    break 1;
                }
                _ => unsafe {
                    TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                },
            }
        };

        unsafe {
            if IsWindow(self.hwnd) != 0 {
                set_user_data(self.hwnd, 0);
            }
            drop(Box::from_raw(context));
        }
        code
    }

    fn teardown(&mut self) {
        unsafe {
            if let Some(id) = self.icon_id.take() {
                let nid = icon_data(self.hwnd, id);
                Shell_NotifyIconW(NIM_DELETE, &nid);
            }
            if self.listening {
                RemoveClipboardFormatListener(self.hwnd);
                self.listening = false;
            }
            if !self.hwnd.is_null() && IsWindow(self.hwnd) != 0 {
                DestroyWindow(self.hwnd);
            }
            if !self.menu.is_null() {
                DestroyMenu(self.menu);
                self.menu = ptr::null_mut();
            }
            if !self.font.is_null() {
                DeleteObject(self.font);
                self.font = ptr::null_mut();
            }
        }
        debug!("Released window, tray icon and font");
    }
}
