//! 接入引导：校验凭据、把配置展开成一组 feed。

use std::sync::Arc;

use log::{info, warn};

use crate::config::FeedConfig;
use crate::emitter::FeedEmitter;
use crate::error::ImmichError;
use crate::feed::{
    AlbumSource, AssetSource, FavoriteSource, FeedTiming, PersonUnionSearchSource, PhotoFeed,
    SearchSource,
};
use crate::immich::{ImmichApi, ImmichClient};

/// 建立会话：校验配置可用、API key 有效。key 被服务端拒绝时报
/// [`ImmichError::InvalidAuth`]；连不上（含 host 写错）报
/// [`ImmichError::CannotConnect`]。
pub async fn connect(config: &FeedConfig) -> Result<Arc<ImmichClient>, ImmichError> {
    if let Err(reason) = config.validate() {
        return Err(ImmichError::CannotConnect(reason));
    }

    let client = Arc::new(ImmichClient::new(
        config.host.clone(),
        config.api_key.clone(),
    ));
    if !client.authenticate().await? {
        return Err(ImmichError::InvalidAuth);
    }

    let user = client.get_my_user_info().await?;
    info!("Connected to Immich as {} <{}>", user.name, user.email);
    Ok(client)
}

/// 把配置展开成一组 feed：一条收藏流、每个被关注的画册一条、每条检索一条。
/// 画册名在这里解析一次；配置里不存在于服务端的画册记日志跳过。
pub async fn build_feeds(
    api: Arc<dyn ImmichApi>,
    config: &FeedConfig,
    timing: FeedTiming,
    emitter: Arc<FeedEmitter>,
) -> Result<Vec<Arc<PhotoFeed>>, ImmichError> {
    let mut feeds = vec![Arc::new(PhotoFeed::new(
        api.clone(),
        Box::new(FavoriteSource::new(api.clone())),
        timing.clone(),
        emitter.clone(),
    ))];

    if !config.watched_albums.is_empty() {
        let albums = api.list_all_albums().await?;
        for watched in &config.watched_albums {
            match albums.iter().find(|album| &album.id == watched) {
                Some(album) => {
                    feeds.push(Arc::new(PhotoFeed::new(
                        api.clone(),
                        Box::new(AlbumSource::new(
                            api.clone(),
                            album.id.clone(),
                            &album.album_name,
                        )),
                        timing.clone(),
                        emitter.clone(),
                    )));
                }
                None => {
                    warn!("Watched album {watched} does not exist on the server, skipping");
                }
            }
        }
    }

    for search in &config.searches {
        // 带人物列表的检索按人取并集，其余按原条件单次查询
        let source: Box<dyn AssetSource> = if search.filter.person_ids.is_empty() {
            Box::new(SearchSource::new(
                api.clone(),
                search.unique_id.clone(),
                format!("Immich: {}", search.name),
                search.filter.clone(),
            ))
        } else {
            Box::new(PersonUnionSearchSource::new(
                api.clone(),
                search.unique_id.clone(),
                format!("Immich: {}", search.name),
                search.filter.clone(),
            ))
        };
        feeds.push(Arc::new(PhotoFeed::new(
            api.clone(),
            source,
            timing.clone(),
            emitter.clone(),
        )));
    }

    Ok(feeds)
}
