// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android platform bridge via JNI.
//
// Requires the Android NDK and targets `aarch64-linux-android` or
// `armv7-linux-androideabi`. Preview and share go through Intents launched
// on the hosting Activity; file URIs are converted to `content://` URIs via
// the app's `FileProvider` (authority `<applicationId>.fileprovider`), which
// the host manifest must declare with the files directory as a shared path.
//
// Downloads use the HTTP download service rather than
// `android.app.DownloadManager`, whose completion is only observable through
// a BroadcastReceiver registered on the Java side.

#![cfg(target_os = "android")]

use std::path::Path;

use jni::objects::{JObject, JString, JValue};
use jni::{AttachGuard, JNIEnv, JavaVM};

use docviewer_core::error::Result;
use docviewer_core::{
    DocViewerError, PlatformError, PreviewInfo, UriPermissions, ViewerConfig, file_name_from_uri,
    mime,
};

use crate::download::{DownloadTask, HttpDownloadService};
use crate::traits::*;

const ACTION_VIEW: &str = "android.intent.action.VIEW";
const ACTION_SEND: &str = "android.intent.action.SEND";
const EXTRA_STREAM: &str = "android.intent.extra.STREAM";
const FLAG_ACTIVITY_NEW_TASK: i32 = 0x1000_0000;

// ---------------------------------------------------------------------------
// JNI bootstrap helpers
// ---------------------------------------------------------------------------

/// Obtain the current Android `Activity` as a [`JObject`].
///
/// The pointer comes from `ndk_context::android_context().context()` which
/// is the `jobject` for the Activity hosting the native code.
fn activity() -> BridgeResult<JObject<'static>> {
    let ptr = ndk_context::android_context().context();
    if ptr.is_null() {
        return Err(PlatformError::bridge(
            "Android context is null, native activity not initialised",
        ));
    }
    // SAFETY: the NDK guarantees this pointer is a valid global jobject for
    // the hosting Activity.
    Ok(unsafe { JObject::from_raw(ptr.cast()) })
}

/// Convenience: map any `jni::errors::Error` into a bridge `PlatformError`.
fn jni_err(context: &str, e: jni::errors::Error) -> PlatformError {
    PlatformError::bridge(format!("{context}: {e}"))
}

// ---------------------------------------------------------------------------
// Bridge struct
// ---------------------------------------------------------------------------

/// Android implementation of the DocViewer platform bridge.
pub struct AndroidBridge {
    vm: JavaVM,
    downloads: HttpDownloadService,
}

impl AndroidBridge {
    /// Create a new Android bridge bound to the process JavaVM.
    pub fn new(config: &ViewerConfig) -> Result<Self> {
        let ctx = ndk_context::android_context();
        // SAFETY: `ctx.vm()` returns the `JavaVM*` set by the NDK glue code.
        // The pointer is valid for the lifetime of the process.
        let vm = unsafe { JavaVM::from_raw(ctx.vm().cast()) }
            .map_err(|e| DocViewerError::Bridge(format!("failed to obtain JavaVM: {e}")))?;
        let downloads =
            HttpDownloadService::new(config).map_err(|e| DocViewerError::Bridge(e.to_string()))?;
        Ok(Self { vm, downloads })
    }

    fn env(&self) -> BridgeResult<AttachGuard<'_>> {
        self.vm
            .attach_current_thread()
            .map_err(|e| jni_err("attach_current_thread", e))
    }
}

impl PlatformBridge for AndroidBridge {
    fn platform_name(&self) -> &str {
        "Android"
    }
}

// ---------------------------------------------------------------------------
// NativePreview: Intent ACTION_VIEW
// ---------------------------------------------------------------------------

impl NativePreview for AndroidBridge {
    /// Ask the PackageManager whether any activity can handle ACTION_VIEW
    /// for the file.
    fn can_preview(&self, uri: &str) -> BridgeResult<bool> {
        let mut env = self.env()?;
        let activity = activity()?;
        let mime_type = mime::mime_for_name(&file_name_from_uri(uri));

        let content_uri = content_uri(&mut env, &activity, uri)?;
        let intent = view_intent(&mut env, &content_uri, mime_type)?;

        let package_manager: JObject = env
            .call_method(
                &activity,
                "getPackageManager",
                "()Landroid/content/pm/PackageManager;",
                &[],
            )
            .map_err(|e| jni_err("getPackageManager", e))?
            .l()
            .map_err(|e| jni_err("getPackageManager->l", e))?;

        let component: JObject = env
            .call_method(
                &intent,
                "resolveActivity",
                "(Landroid/content/pm/PackageManager;)Landroid/content/ComponentName;",
                &[JValue::Object(&package_manager)],
            )
            .map_err(|e| jni_err("resolveActivity", e))?
            .l()
            .map_err(|e| jni_err("resolveActivity->l", e))?;

        let capable = !component.is_null();
        tracing::debug!(uri, mime = mime_type, capable, "Android: preview capability");
        Ok(capable)
    }

    fn open_preview(&self, info: &PreviewInfo) -> BridgeResult<()> {
        let mut env = self.env()?;
        let activity = activity()?;

        tracing::info!(
            title = %info.title,
            mime = %info.mime_type,
            "Android: dispatching view intent"
        );

        let content_uri = content_uri(&mut env, &activity, &info.uri)?;
        let intent = view_intent(&mut env, &content_uri, &info.mime_type)?;

        env.call_method(
            &activity,
            "startActivity",
            "(Landroid/content/Intent;)V",
            &[JValue::Object(&intent)],
        )
        .map_err(|e| jni_err("startActivity(view)", e))?;

        tracing::info!("Android: view intent dispatched successfully");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// NativeShare: Intent ACTION_SEND
// ---------------------------------------------------------------------------

impl NativeShare for AndroidBridge {
    /// Share a file via the Android chooser (`Intent.ACTION_SEND`), granting
    /// the receiving app the requested URI permissions.
    fn share_file(
        &self,
        uri: &str,
        mime_type: &str,
        permissions: UriPermissions,
    ) -> BridgeResult<()> {
        let mut env = self.env()?;
        let activity = activity()?;

        tracing::info!(
            uri,
            mime = mime_type,
            flags = permissions.flags(),
            "Android: launching share intent"
        );

        let content_uri = content_uri(&mut env, &activity, uri)?;

        let j_action: JString = env
            .new_string(ACTION_SEND)
            .map_err(|e| jni_err("new_string(ACTION_SEND)", e))?;
        let intent: JObject = env
            .new_object(
                "android/content/Intent",
                "(Ljava/lang/String;)V",
                &[JValue::Object(&j_action)],
            )
            .map_err(|e| jni_err("new Intent(SEND)", e))?;

        let j_mime: JString = env
            .new_string(mime_type)
            .map_err(|e| jni_err("new_string(mime)", e))?;
        env.call_method(
            &intent,
            "setType",
            "(Ljava/lang/String;)Landroid/content/Intent;",
            &[JValue::Object(&j_mime)],
        )
        .map_err(|e| jni_err("setType(share)", e))?;

        let j_extra_stream: JString = env
            .new_string(EXTRA_STREAM)
            .map_err(|e| jni_err("new_string(EXTRA_STREAM)", e))?;
        env.call_method(
            &intent,
            "putExtra",
            "(Ljava/lang/String;Landroid/os/Parcelable;)Landroid/content/Intent;",
            &[
                JValue::Object(&j_extra_stream),
                JValue::Object(&content_uri),
            ],
        )
        .map_err(|e| jni_err("putExtra(EXTRA_STREAM)", e))?;

        env.call_method(
            &intent,
            "addFlags",
            "(I)Landroid/content/Intent;",
            &[JValue::Int(permissions.flags())],
        )
        .map_err(|e| jni_err("addFlags(share)", e))?;

        // -- Wrap in a chooser --------------------------------------------------
        let j_title: JString = env
            .new_string("Share via")
            .map_err(|e| jni_err("new_string(chooser_title)", e))?;
        let chooser: JObject = env
            .call_static_method(
                "android/content/Intent",
                "createChooser",
                "(Landroid/content/Intent;Ljava/lang/CharSequence;)Landroid/content/Intent;",
                &[JValue::Object(&intent), JValue::Object(&j_title)],
            )
            .map_err(|e| jni_err("Intent.createChooser", e))?
            .l()
            .map_err(|e| jni_err("createChooser->l", e))?;

        env.call_method(
            &activity,
            "startActivity",
            "(Landroid/content/Intent;)V",
            &[JValue::Object(&chooser)],
        )
        .map_err(|e| jni_err("startActivity(share)", e))?;

        tracing::info!(uri, "Android: share intent dispatched");
        Ok(())
    }
}

impl NativeDownload for AndroidBridge {
    fn start_download(&self, url: &str, dest: &Path) -> BridgeResult<DownloadTask> {
        self.downloads.start(url, dest)
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Build `Intent(ACTION_VIEW)` with data, type and the read grant.
fn view_intent<'a>(
    env: &mut JNIEnv<'a>,
    content_uri: &JObject<'_>,
    mime_type: &str,
) -> BridgeResult<JObject<'a>> {
    let j_action: JString = env
        .new_string(ACTION_VIEW)
        .map_err(|e| jni_err("new_string(ACTION_VIEW)", e))?;
    let intent: JObject = env
        .new_object(
            "android/content/Intent",
            "(Ljava/lang/String;)V",
            &[JValue::Object(&j_action)],
        )
        .map_err(|e| jni_err("new Intent(VIEW)", e))?;

    let j_mime: JString = env
        .new_string(mime_type)
        .map_err(|e| jni_err("new_string(mime_type)", e))?;
    env.call_method(
        &intent,
        "setDataAndType",
        "(Landroid/net/Uri;Ljava/lang/String;)Landroid/content/Intent;",
        &[JValue::Object(content_uri), JValue::Object(&j_mime)],
    )
    .map_err(|e| jni_err("setDataAndType", e))?;

    env.call_method(
        &intent,
        "addFlags",
        "(I)Landroid/content/Intent;",
        &[JValue::Int(UriPermissions::read_only().flags() | FLAG_ACTIVITY_NEW_TASK)],
    )
    .map_err(|e| jni_err("addFlags(view)", e))?;

    Ok(intent)
}

/// Turn a `file://` URI into a `content://` URI through `FileProvider`.
fn content_uri<'a>(
    env: &mut JNIEnv<'a>,
    activity: &JObject<'_>,
    uri: &str,
) -> BridgeResult<JObject<'a>> {
    let path = url::Url::parse(uri)
        .ok()
        .and_then(|u| u.to_file_path().ok())
        .ok_or_else(|| PlatformError::new(401, format!("not a file uri: {uri}")))?;

    let j_path: JString = env
        .new_string(path.to_string_lossy())
        .map_err(|e| jni_err("new_string(path)", e))?;
    let file_obj: JObject = env
        .new_object(
            "java/io/File",
            "(Ljava/lang/String;)V",
            &[JValue::Object(&j_path)],
        )
        .map_err(|e| jni_err("new File(path)", e))?;

    let authority = get_authority(env, activity)?;
    let j_authority: JString = env
        .new_string(&authority)
        .map_err(|e| jni_err("new_string(authority)", e))?;

    env.call_static_method(
        "androidx/core/content/FileProvider",
        "getUriForFile",
        "(Landroid/content/Context;Ljava/lang/String;Ljava/io/File;)Landroid/net/Uri;",
        &[
            JValue::Object(activity),
            JValue::Object(&j_authority),
            JValue::Object(&file_obj),
        ],
    )
    .map_err(|e| jni_err("FileProvider.getUriForFile", e))?
    .l()
    .map_err(|e| jni_err("getUriForFile->l", e))
}

/// FileProvider authority: `<applicationId>.fileprovider`.
fn get_authority(env: &mut JNIEnv<'_>, activity: &JObject<'_>) -> BridgeResult<String> {
    let j_pkg: JObject = env
        .call_method(activity, "getPackageName", "()Ljava/lang/String;", &[])
        .map_err(|e| jni_err("getPackageName", e))?
        .l()
        .map_err(|e| jni_err("getPackageName->l", e))?;

    let pkg: String = env
        .get_string(&JString::from(j_pkg))
        .map_err(|e| jni_err("get_string(packageName)", e))?
        .into();

    Ok(format!("{pkg}.fileprovider"))
}
