use crate::peer::{PeerConnection, PeerConnectionFactory, PeerConnectionState, PeerEventSink};
use anyhow::{Result, bail};
use async_trait::async_trait;
use huddle_core::{IceCandidate, IceServerConfig, SdpKind, SessionDescription};
use std::sync::Arc;
use tracing::{debug, info};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::{API, APIBuilder};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// Builds `webrtc` peer connections sharing one media engine.
pub struct WebRtcPeerFactory {
    api: API,
    rtc_config: RTCConfiguration,
    local_tracks: Vec<Arc<dyn TrackLocal + Send + Sync>>,
}

impl WebRtcPeerFactory {
    pub fn new(ice_servers: &[IceServerConfig]) -> Result<Self> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        Ok(Self {
            api,
            rtc_config,
            local_tracks: Vec::new(),
        })
    }

    /// Adds a track sent to every peer created afterwards.
    pub fn with_local_track(mut self, track: Arc<dyn TrackLocal + Send + Sync>) -> Self {
        self.local_tracks.push(track);
        self
    }
}

#[async_trait]
impl PeerConnectionFactory for WebRtcPeerFactory {
    async fn create(&self, events: PeerEventSink) -> Result<Arc<dyn PeerConnection>> {
        let peer_connection = Arc::new(
            self.api
                .new_peer_connection(self.rtc_config.clone())
                .await?,
        );

        for track in &self.local_tracks {
            peer_connection.add_track(Arc::clone(track)).await?;
        }

        let state_events = events.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let events = state_events.clone();
                Box::pin(async move {
                    info!(
                        "Peer connection state for {} changed: {:?}",
                        events.member(),
                        s
                    );
                    if let Some(state) = map_state(s) {
                        events.state_changed(state);
                    }
                })
            },
        ));

        let ice_events = events.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let events = ice_events.clone();
            Box::pin(async move {
                let Some(candidate) = c else {
                    debug!("ICE gathering complete for {}", events.member());
                    return;
                };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                events.ice_candidate(IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                    username_fragment: init.username_fragment,
                });
            })
        }));

        let track_events = events;
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let events = track_events.clone();
                Box::pin(async move {
                    info!("Track {} received from {}", track.id(), events.member());
                    events.track(track.id(), track.stream_id());
                })
            },
        ));

        Ok(Arc::new(WebRtcPeer { peer_connection }))
    }
}

pub struct WebRtcPeer {
    peer_connection: Arc<RTCPeerConnection>,
}

impl WebRtcPeer {
    /// Ensures the offer asks for both audio and video even without local tracks.
    async fn ensure_receive_transceivers(&self) -> Result<()> {
        let transceivers = self.peer_connection.get_transceivers().await;
        for kind in [RTPCodecType::Audio, RTPCodecType::Video] {
            if !transceivers.iter().any(|t| t.kind() == kind) {
                self.peer_connection
                    .add_transceiver_from_kind(kind, None)
                    .await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl PeerConnection for WebRtcPeer {
    async fn create_offer(&self) -> Result<SessionDescription> {
        self.ensure_receive_transceivers().await?;
        let offer = self.peer_connection.create_offer(None).await?;
        from_rtc(&offer)
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.peer_connection.create_answer(None).await?;
        from_rtc(&answer)
    }

    async fn set_local_description(&self, description: SessionDescription) -> Result<()> {
        self.peer_connection
            .set_local_description(to_rtc(description)?)
            .await?;
        Ok(())
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        self.peer_connection
            .set_remote_description(to_rtc(description)?)
            .await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        self.peer_connection
            .add_ice_candidate(RTCIceCandidateInit {
                candidate: candidate.candidate,
                sdp_mid: candidate.sdp_mid,
                sdp_mline_index: candidate.sdp_m_line_index,
                username_fragment: candidate.username_fragment,
            })
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

fn to_rtc(description: SessionDescription) -> Result<RTCSessionDescription> {
    let desc = match description.kind {
        SdpKind::Offer => RTCSessionDescription::offer(description.sdp)?,
        SdpKind::Answer => RTCSessionDescription::answer(description.sdp)?,
        SdpKind::Pranswer => RTCSessionDescription::pranswer(description.sdp)?,
        SdpKind::Rollback => bail!("rollback descriptions are not supported"),
    };
    Ok(desc)
}

fn from_rtc(description: &RTCSessionDescription) -> Result<SessionDescription> {
    let kind = match description.sdp_type {
        RTCSdpType::Offer => SdpKind::Offer,
        RTCSdpType::Answer => SdpKind::Answer,
        RTCSdpType::Pranswer => SdpKind::Pranswer,
        RTCSdpType::Rollback => SdpKind::Rollback,
        RTCSdpType::Unspecified => bail!("session description has no type"),
    };
    Ok(SessionDescription {
        kind,
        sdp: description.sdp.clone(),
    })
}

fn map_state(state: RTCPeerConnectionState) -> Option<PeerConnectionState> {
    let mapped = match state {
        RTCPeerConnectionState::New => PeerConnectionState::New,
        RTCPeerConnectionState::Connecting => PeerConnectionState::Connecting,
        RTCPeerConnectionState::Connected => PeerConnectionState::Connected,
        RTCPeerConnectionState::Disconnected => PeerConnectionState::Disconnected,
        RTCPeerConnectionState::Failed => PeerConnectionState::Failed,
        RTCPeerConnectionState::Closed => PeerConnectionState::Closed,
        RTCPeerConnectionState::Unspecified => return None,
    };
    Some(mapped)
}
